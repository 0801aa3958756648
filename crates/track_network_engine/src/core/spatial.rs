//! Spatial-Index (KD-Tree) für Nächster-Vertex-Abfragen.

use super::ids::VertexId;
use glam::DVec2;
use kiddo::{KdTree, SquaredEuclidean};

/// Ergebnis einer Distanzabfrage gegen den Spatial-Index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialMatch {
    /// ID des gefundenen Vertex
    pub vertex_id: VertexId,
    /// Euklidische Distanz zum Suchpunkt
    pub distance: f64,
}

/// Read-only Spatial-Index über alle Vertex-Positionen der Welt.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: KdTree<f64, 2>,
    vertex_ids: Vec<VertexId>,
}

impl SpatialIndex {
    /// Erstellt einen leeren Spatial-Index.
    pub fn empty() -> Self {
        Self {
            tree: (&Vec::<[f64; 2]>::new()).into(),
            vertex_ids: Vec::new(),
        }
    }

    /// Baut einen Index aus `(id, position)`-Paaren. Reihenfolge nach ID.
    pub fn from_points(points: impl IntoIterator<Item = (VertexId, DVec2)>) -> Self {
        let mut points: Vec<(VertexId, DVec2)> = points.into_iter().collect();
        points.sort_unstable_by_key(|(id, _)| *id);

        let entries: Vec<[f64; 2]> = points.iter().map(|(_, p)| [p.x, p.y]).collect();
        let tree: KdTree<f64, 2> = (&entries).into();

        Self {
            tree,
            vertex_ids: points.into_iter().map(|(id, _)| id).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.vertex_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_ids.is_empty()
    }

    /// Findet den nächsten Vertex zur Weltposition.
    pub fn nearest(&self, query: DVec2) -> Option<SpatialMatch> {
        if self.is_empty() {
            return None;
        }

        let result = self.tree.nearest_one::<SquaredEuclidean>(&[query.x, query.y]);
        let vertex_id = *self.vertex_ids.get(result.item as usize)?;

        Some(SpatialMatch {
            vertex_id,
            distance: result.distance.sqrt(),
        })
    }

    /// Alle Vertices innerhalb eines Radius, nach Distanz sortiert.
    pub fn within_radius(&self, query: DVec2, radius: f64) -> Vec<SpatialMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }

        let mut results = self
            .tree
            .within::<SquaredEuclidean>(&[query.x, query.y], radius * radius)
            .into_iter()
            .filter_map(|entry| {
                let vertex_id = *self.vertex_ids.get(entry.item as usize)?;
                Some(SpatialMatch {
                    vertex_id,
                    distance: entry.distance.sqrt(),
                })
            })
            .collect::<Vec<_>>();

        results.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.vertex_id.cmp(&b.vertex_id))
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SpatialIndex {
        SpatialIndex::from_points([
            (VertexId(1), DVec2::new(0.0, 0.0)),
            (VertexId(2), DVec2::new(10.0, 0.0)),
            (VertexId(3), DVec2::new(4.0, 3.0)),
        ])
    }

    #[test]
    fn nearest_returns_expected_vertex() {
        let nearest = sample_index()
            .nearest(DVec2::new(3.9, 2.9))
            .expect("Treffer erwartet");

        assert_eq!(nearest.vertex_id, VertexId(3));
        assert!(nearest.distance < 0.2);
    }

    #[test]
    fn radius_query_returns_sorted_matches() {
        let ids: Vec<VertexId> = sample_index()
            .within_radius(DVec2::ZERO, 6.0)
            .into_iter()
            .map(|m| m.vertex_id)
            .collect();
        assert_eq!(ids, vec![VertexId(1), VertexId(3)]);
    }

    #[test]
    fn empty_index_has_no_entries() {
        let index = SpatialIndex::empty();
        assert!(index.is_empty());
        assert!(index.nearest(DVec2::ZERO).is_none());
    }
}
