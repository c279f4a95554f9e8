//! Enumerated candidate values for each tunable content parameter.

use serde::{Deserialize, Serialize};

use amp_types::ParameterValue;

/// A single searchable dimension and its ordered candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Parameter name as it appears in a configuration (e.g. "cta_type").
    pub name: String,
    /// Legal values, in the order the optimizer tries them.
    pub candidates: Vec<ParameterValue>,
}

/// The full domain: an ordered list of dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDomain {
    pub dimensions: Vec<DomainEntry>,
}

impl ParameterDomain {
    pub fn new() -> Self {
        Self {
            dimensions: Vec::new(),
        }
    }

    /// The stock table of content parameters and their legal values.
    pub fn content_defaults() -> Self {
        Self::new()
            .add_choice("post_type", ["image", "video", "carousel", "text", "link"])
            .add_choice("cta_type", ["learn_more", "shop_now", "sign_up", "follow"])
            .add_int_range("num_hashtags", 0, 6)
            .add_choice("posting_hour", [6, 9, 12, 15, 18, 21])
            .add_choice("content_length", ["short", "medium", "long"])
            .add_choice("tone", ["informative", "playful", "urgent", "inspirational"])
            .add_flag("has_emoji")
    }

    /// Adds (or replaces, keeping its position) a categorical dimension.
    pub fn add_choice<V: Into<ParameterValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let entry = DomainEntry {
            name: name.into(),
            candidates: values.into_iter().map(Into::into).collect(),
        };
        match self.dimensions.iter_mut().find(|d| d.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.dimensions.push(entry),
        }
        self
    }

    /// Integer range [low, high] inclusive, ascending.
    pub fn add_int_range(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add_choice(name, (low..=high).map(ParameterValue::Int))
    }

    /// Boolean dimension, tried as `false` then `true`.
    pub fn add_flag(self, name: impl Into<String>) -> Self {
        self.add_choice(name, [false, true])
    }

    pub fn candidates(&self, name: &str) -> Option<&[ParameterValue]> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.candidates.as_slice())
    }

    pub fn dimension_names(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.name.clone()).collect()
    }

    /// Total number of points in the joint grid (`None` on overflow).
    pub fn grid_size(&self) -> Option<usize> {
        let mut total: usize = 1;
        for dim in &self.dimensions {
            total = total.checked_mul(dim.candidates.len())?;
        }
        Some(total)
    }

    /// Upper bound on scoring calls for one coordinate-ascent pass over
    /// `dimensions`, baseline included. Unknown names cost nothing.
    pub fn evaluation_budget<D: AsRef<str>>(&self, dimensions: &[D]) -> usize {
        1 + dimensions
            .iter()
            .filter_map(|d| self.candidates(d.as_ref()))
            .map(<[ParameterValue]>::len)
            .sum::<usize>()
    }
}

impl Default for ParameterDomain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_defaults_cover_expected_dimensions() {
        let domain = ParameterDomain::content_defaults();
        assert_eq!(
            domain.dimension_names(),
            vec![
                "post_type",
                "cta_type",
                "num_hashtags",
                "posting_hour",
                "content_length",
                "tone",
                "has_emoji"
            ]
        );
        let hashtags = domain.candidates("num_hashtags").unwrap();
        assert_eq!(hashtags.len(), 7);
        assert_eq!(hashtags[0], ParameterValue::Int(0));
        assert_eq!(hashtags[6], ParameterValue::Int(6));
    }

    #[test]
    fn grid_size_multiplies_dimensions() {
        let domain = ParameterDomain::new()
            .add_int_range("a", 1, 3) // 3 values
            .add_flag("b"); // 2 values
        assert_eq!(domain.grid_size(), Some(6));
        assert_eq!(ParameterDomain::new().grid_size(), Some(1));
    }

    #[test]
    fn add_choice_replaces_in_place() {
        let domain = ParameterDomain::new()
            .add_choice("x", ["a", "b"])
            .add_flag("y")
            .add_choice("x", ["c"]);
        assert_eq!(domain.dimension_names(), vec!["x", "y"]);
        assert_eq!(domain.candidates("x").unwrap(), &[ParameterValue::from("c")]);
    }

    #[test]
    fn evaluation_budget_ignores_unknown_dimensions() {
        let domain = ParameterDomain::content_defaults();
        assert_eq!(domain.evaluation_budget::<&str>(&[]), 1);
        assert_eq!(domain.evaluation_budget(&["cta_type", "nope", "has_emoji"]), 1 + 4 + 2);
    }

    #[test]
    fn domain_serializes_as_ordered_entries() {
        let domain = ParameterDomain::new().add_choice("cta_type", ["shop_now", "follow"]);
        let json = serde_json::to_value(&domain).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "dimensions": [{"name": "cta_type", "candidates": ["shop_now", "follow"]}]
            })
        );
    }
}
