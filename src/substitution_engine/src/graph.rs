//! Weighted equivalence graph over any [`Identity`].
//!
//! Built once per import from validated links and never mutated afterwards.
//! Node lookup is a hash probe; neighbor lists are pre-sorted (score desc,
//! identity asc) so enumeration is a slice walk.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    errors::{ImportError, LookupError},
    model::{EquivalenceLink, Identity, LinkKind},
};

/// One adjacent identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor<Id> {
    /// The neighbor.
    pub id: Id,
    /// Link similarity.
    pub score: f64,
    /// Link strength class.
    pub kind: LinkKind,
}

/// An identity found by [`EquivalenceGraph::reach`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reached<Id> {
    /// The identity reached.
    pub id: Id,
    /// Root weight multiplied by every link score on the path.
    pub score: f64,
    /// The identity whose link produced this one.
    pub via: Id,
}

/// Adjacency lists keyed by identity.
#[derive(Debug, Clone)]
pub struct EquivalenceGraph<Id> {
    adjacency: HashMap<Id, Vec<Neighbor<Id>>>,
    links: usize,
}

impl<Id: Identity> Default for EquivalenceGraph<Id> {
    fn default() -> Self {
        Self {
            adjacency: HashMap::new(),
            links: 0,
        }
    }
}

impl<Id: Identity> EquivalenceGraph<Id> {
    /// Builds the graph over `nodes`.
    ///
    /// Links are undirected. Parallel links between the same pair collapse to
    /// the highest score (stronger kind on ties).
    ///
    /// Errors:
    /// - a link whose ends are the same identity
    /// - a score that is NaN or outside `[0, 1]`
    /// - a link end that is not in `nodes`
    pub fn build<'a>(
        nodes: impl IntoIterator<Item = Id>,
        links: impl IntoIterator<Item = &'a EquivalenceLink<Id>>,
        entity: &'static str,
    ) -> Result<Self, ImportError> {
        let mut adjacency: HashMap<Id, Vec<Neighbor<Id>>> =
            nodes.into_iter().map(|id| (id, Vec::new())).collect();

        let mut pairs: HashMap<(Id, Id), (f64, LinkKind)> = HashMap::new();
        for link in links {
            if link.a == link.b {
                return Err(ImportError::SelfLink {
                    entity,
                    code: link.a.to_string(),
                });
            }
            if !(0.0..=1.0).contains(&link.score) {
                return Err(ImportError::ScoreOutOfRange {
                    entity,
                    a: link.a.to_string(),
                    b: link.b.to_string(),
                    score: link.score,
                });
            }
            for end in [&link.a, &link.b] {
                if !adjacency.contains_key(end) {
                    return Err(ImportError::UnknownReference {
                        entity,
                        code: end.to_string(),
                    });
                }
            }

            let key = if link.a < link.b {
                (link.a.clone(), link.b.clone())
            } else {
                (link.b.clone(), link.a.clone())
            };
            let candidate = (link.score, link.kind);
            pairs
                .entry(key)
                .and_modify(|best| {
                    if candidate.0 > best.0 || (candidate.0 == best.0 && candidate.1 > best.1) {
                        *best = candidate;
                    }
                })
                .or_insert(candidate);
        }

        let links = pairs.len();
        for ((a, b), (score, kind)) in pairs {
            if let Some(list) = adjacency.get_mut(&a) {
                list.push(Neighbor {
                    id: b.clone(),
                    score,
                    kind,
                });
            }
            if let Some(list) = adjacency.get_mut(&b) {
                list.push(Neighbor { id: a, score, kind });
            }
        }
        for list in adjacency.values_mut() {
            list.sort_by(|x, y| y.score.total_cmp(&x.score).then_with(|| x.id.cmp(&y.id)));
        }

        Ok(Self { adjacency, links })
    }

    /// Direct neighbors, score descending, ties by identity ascending.
    pub fn neighbors(&self, id: &Id) -> Result<&[Neighbor<Id>], LookupError> {
        self.adjacency
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::UnknownProduct(id.to_string()))
    }

    /// Whether the identity itself is part of the graph.
    pub fn exact_match(&self, id: &Id) -> bool {
        self.adjacency.contains_key(id)
    }

    /// Number of known identities.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// True when nothing has been imported.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of distinct undirected links.
    pub fn link_count(&self) -> usize {
        self.links
    }

    /// Collects equivalents of the weighted `roots`.
    ///
    /// Hop limit is one, except that a neighbor reached through an
    /// [`LinkKind::Exact`] link is expanded once more. Scores multiply along
    /// the path. A root is returned only when a path through another root
    /// scores above its own weight; unknown roots are skipped. When an
    /// identity is reachable several ways the highest score wins. Output is
    /// sorted score desc, identity asc.
    pub fn reach(&self, roots: &[(Id, f64)]) -> Vec<Reached<Id>> {
        let root_weights: HashMap<&Id, f64> = roots.iter().map(|(id, w)| (id, *w)).collect();
        let mut best: HashMap<Id, Reached<Id>> = HashMap::new();

        let mut offer = |id: &Id, score: f64, via: &Id| {
            if root_weights.get(id).is_some_and(|w| score <= *w) {
                return;
            }
            match best.get_mut(id) {
                Some(cur) if score > cur.score || (score == cur.score && *via < cur.via) => {
                    cur.score = score;
                    cur.via = via.clone();
                }
                Some(_) => {}
                None => {
                    best.insert(
                        id.clone(),
                        Reached {
                            id: id.clone(),
                            score,
                            via: via.clone(),
                        },
                    );
                }
            }
        };

        for (root, weight) in roots {
            let Some(first_hop) = self.adjacency.get(root) else {
                continue;
            };
            for n in first_hop {
                let score = weight * n.score;
                offer(&n.id, score, root);

                if n.kind != LinkKind::Exact {
                    continue;
                }
                let Some(second_hop) = self.adjacency.get(&n.id) else {
                    continue;
                };
                for m in second_hop.iter().filter(|m| m.id != *root) {
                    offer(&m.id, score * m.score, &n.id);
                }
            }
        }

        let mut out: Vec<Reached<Id>> = best.into_values().collect();
        out.sort_by(|x, y| y.score.total_cmp(&x.score).then_with(|| x.id.cmp(&y.id)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductCode;

    fn code(s: &str) -> ProductCode {
        ProductCode::new(s)
    }

    fn link(a: &str, b: &str, score: f64, kind: LinkKind) -> EquivalenceLink<ProductCode> {
        EquivalenceLink::new(a, b, score, kind)
    }

    fn graph(nodes: &[&str], links: &[EquivalenceLink<ProductCode>]) -> EquivalenceGraph<ProductCode> {
        EquivalenceGraph::build(nodes.iter().map(|n| code(n)), links, "product").unwrap()
    }

    #[test]
    fn neighbors_sorted_by_score_then_code() {
        let g = graph(
            &["A", "B", "C", "D"],
            &[
                link("A", "C", 0.7, LinkKind::Equivalent),
                link("A", "B", 0.7, LinkKind::Equivalent),
                link("D", "A", 0.9, LinkKind::Alternative),
            ],
        );
        let ids: Vec<&str> = g.neighbors(&code("A")).unwrap().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["D", "B", "C"]);
        // undirected
        assert_eq!(g.neighbors(&code("D")).unwrap()[0].id, code("A"));
        assert_eq!(g.link_count(), 3);
    }

    #[test]
    fn isolated_node_is_known_with_no_neighbors() {
        let g = graph(&["A"], &[]);
        assert!(g.exact_match(&code("a")));
        assert!(g.neighbors(&code("A")).unwrap().is_empty());
    }

    #[test]
    fn unknown_identity_is_a_lookup_error() {
        let g = graph(&["A"], &[]);
        assert_eq!(
            g.neighbors(&code("Z")).unwrap_err(),
            LookupError::UnknownProduct("Z".into())
        );
        assert!(!g.exact_match(&code("Z")));
    }

    #[test]
    fn parallel_links_keep_highest_score() {
        let g = graph(
            &["A", "B"],
            &[
                link("A", "B", 0.4, LinkKind::Equivalent),
                link("B", "A", 0.8, LinkKind::Alternative),
                link("A", "B", 0.8, LinkKind::Exact),
            ],
        );
        let n = g.neighbors(&code("A")).unwrap();
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].score, 0.8);
        assert_eq!(n[0].kind, LinkKind::Exact);
        assert_eq!(g.link_count(), 1);
    }

    #[test]
    fn rejects_malformed_links() {
        let nodes = || ["A", "B"].into_iter().map(code);
        let err = EquivalenceGraph::build(nodes(), &[link("A", "a", 0.5, LinkKind::Exact)], "product")
            .unwrap_err();
        assert!(matches!(err, ImportError::SelfLink { .. }));

        let err = EquivalenceGraph::build(nodes(), &[link("A", "B", 1.2, LinkKind::Exact)], "product")
            .unwrap_err();
        assert!(matches!(err, ImportError::ScoreOutOfRange { .. }));

        let err = EquivalenceGraph::build(nodes(), &[link("A", "B", f64::NAN, LinkKind::Exact)], "product")
            .unwrap_err();
        assert!(matches!(err, ImportError::ScoreOutOfRange { .. }));

        let err = EquivalenceGraph::build(nodes(), &[link("A", "Q", 0.5, LinkKind::Exact)], "product")
            .unwrap_err();
        assert_eq!(
            err,
            ImportError::UnknownReference {
                entity: "product",
                code: "Q".into()
            }
        );
    }

    #[test]
    fn reach_chains_once_through_exact_links() {
        let g = graph(
            &["A", "B", "C", "D", "E"],
            &[
                link("A", "B", 0.9, LinkKind::Exact),
                link("B", "C", 0.5, LinkKind::Equivalent),
                link("A", "D", 0.8, LinkKind::Equivalent),
                // D is not an exact neighbor, so E stays out of reach
                link("D", "E", 1.0, LinkKind::Exact),
            ],
        );
        let reached = g.reach(&[(code("A"), 1.0)]);
        let got: Vec<(&str, f64, &str)> = reached
            .iter()
            .map(|r| (r.id.as_str(), r.score, r.via.as_str()))
            .collect();
        assert_eq!(got, [("B", 0.9, "A"), ("D", 0.8, "A"), ("C", 0.45, "B")]);
    }

    #[test]
    fn reach_weights_by_root_and_keeps_best_path() {
        let g = graph(
            &["R1", "R2", "X"],
            &[
                link("R1", "X", 0.5, LinkKind::Equivalent),
                link("R2", "X", 0.9, LinkKind::Equivalent),
            ],
        );
        let reached = g.reach(&[(code("R1"), 1.0), (code("R2"), 0.5), (code("NOPE"), 1.0)]);
        assert_eq!(reached.len(), 1);
        assert_eq!(reached[0].via, code("R1"));
        assert_eq!(reached[0].score, 0.5);
    }

    #[test]
    fn reach_skips_roots_unless_a_path_beats_their_weight() {
        let g = graph(&["A", "B"], &[link("A", "B", 1.0, LinkKind::Exact)]);
        assert!(g.reach(&[(code("A"), 1.0), (code("B"), 1.0)]).is_empty());

        // B resolved weakly but linked from a strong root
        let g = graph(&["A", "B"], &[link("A", "B", 0.9, LinkKind::Equivalent)]);
        let reached = g.reach(&[(code("A"), 1.0), (code("B"), 0.3)]);
        assert_eq!(reached.len(), 1);
        assert_eq!(reached[0].id, code("B"));
        assert_eq!(reached[0].score, 0.9);
        assert_eq!(reached[0].via, code("A"));
    }
}
