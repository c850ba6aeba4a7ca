//! Category label normalisation.

use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::domain::products::records::{CategoryDescriptor, CategoryEntry};

/// Reduce a category listing to display labels.
///
/// Descriptors contribute their `name`, else `slug`, else `title`. Scalar
/// entries are stringified; nulls, empty strings and structured values are
/// dropped. Duplicates are removed keeping the first occurrence.
#[must_use]
pub fn category_labels(entries: Vec<CategoryEntry>) -> Vec<String> {
    let mut seen = FxHashSet::default();

    entries
        .into_iter()
        .filter_map(label)
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

fn label(entry: CategoryEntry) -> Option<String> {
    let label = match entry {
        CategoryEntry::Label(label) => label,
        CategoryEntry::Descriptor(CategoryDescriptor { name, slug, title }) => {
            [name, slug, title]
                .into_iter()
                .flatten()
                .find(|candidate| !candidate.trim().is_empty())?
        }
        CategoryEntry::Malformed(Value::Number(number)) => number.to_string(),
        CategoryEntry::Malformed(Value::Bool(flag)) => flag.to_string(),
        CategoryEntry::Malformed(_) => return None,
    };

    let label = label.trim();

    (!label.is_empty()).then(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn malformed_entries_are_coerced_and_deduplicated() -> TestResult {
        let entries: Vec<CategoryEntry> = serde_json::from_value(json!([
            "beauty",
            {"slug": "fragrances", "name": "Fragrances"},
            {"slug": "furniture"},
            42,
            null,
            "",
            "beauty",
            {"title": "Groceries"},
            true,
            42
        ]))?;

        assert_eq!(
            category_labels(entries),
            vec!["beauty", "Fragrances", "furniture", "42", "Groceries", "true"]
        );

        Ok(())
    }

    #[test]
    fn empty_descriptor_is_dropped() {
        let entries = vec![
            CategoryEntry::Descriptor(CategoryDescriptor::default()),
            CategoryEntry::Label("laptops".into()),
        ];

        assert_eq!(category_labels(entries), vec!["laptops"]);
    }
}
