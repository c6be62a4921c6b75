//! Sparse fieldset selection

use crate::core::field::FieldDefinition;
use crate::core::query::SparseFieldsets;
use crate::core::resource_type::ResourceType;

/// Fields of a resource type to normalize for the current request
///
/// Internal fields are never selected. When the request names a fieldset
/// for the type, the result is that set intersected with the type's
/// fields; the canonical field order is kept either way and unknown names
/// are ignored.
pub fn select_fields<'r>(
    resource_type: &'r ResourceType,
    fieldsets: &SparseFieldsets,
) -> Vec<&'r FieldDefinition> {
    let requested = fieldsets.get(resource_type.type_name());

    resource_type
        .fields()
        .filter(|field| !field.internal)
        .filter(|field| requested.is_none_or(|names| names.iter().any(|n| *n == field.name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityKind;
    use crate::core::field::Cardinality;

    fn article() -> ResourceType {
        ResourceType::new(
            "node",
            "article",
            EntityKind::Content,
            [
                FieldDefinition::attribute("title"),
                FieldDefinition::attribute("revision_log").internal(),
                FieldDefinition::relationship("uid", Cardinality::One),
                FieldDefinition::relationship("field_tags", Cardinality::Unlimited),
            ],
        )
        .unwrap()
    }

    fn names(fields: Vec<&FieldDefinition>) -> Vec<&str> {
        fields.into_iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_no_fieldset_selects_all_public_fields() {
        let rt = article();
        let selected = select_fields(&rt, &SparseFieldsets::new());
        assert_eq!(names(selected), vec!["title", "uid", "field_tags"]);
    }

    #[test]
    fn test_fieldset_keeps_canonical_order() {
        let rt = article();
        let fieldsets = SparseFieldsets::new().with("node--article", ["field_tags", "title"]);
        assert_eq!(names(select_fields(&rt, &fieldsets)), vec!["title", "field_tags"]);
    }

    #[test]
    fn test_fieldset_ignores_unknown_and_internal_names() {
        let rt = article();
        let fieldsets =
            SparseFieldsets::new().with("node--article", ["nonexistent", "revision_log", "uid"]);
        assert_eq!(names(select_fields(&rt, &fieldsets)), vec!["uid"]);
    }

    #[test]
    fn test_fieldset_for_other_type_does_not_apply() {
        let rt = article();
        let fieldsets = SparseFieldsets::new().with("user--user", ["name"]);
        assert_eq!(select_fields(&rt, &fieldsets).len(), 3);
    }
}
