//! Schemas of the collections the back-office manages.

use super::CollectionSchema;
use super::FieldSpec;
use super::ID_FIELD;
use super::UpdatePolicy;
use crate::query::Direction;
use crate::query::SearchScope;

/// Named prices used by checkout (`/prices`).
pub fn prices() -> CollectionSchema {
    CollectionSchema::new("Prices", "prices")
        .field(FieldSpec::text("price_name").required())
        .field(FieldSpec::text("price_description"))
        .field(FieldSpec::numeric("price_value").required())
        .field(FieldSpec::date("created_at").hidden())
        .field(FieldSpec::date("updated_at").hidden())
        .sort_by("price_name", Direction::Ascending)
}

/// Envelope colors (`/envelope_colors`).
pub fn envelope_colors() -> CollectionSchema {
    color_schema("Envelope colors", "envelope_colors")
}

/// Paper colors (`/paper_colors`).
pub fn paper_colors() -> CollectionSchema {
    color_schema("Paper colors", "paper_colors")
}

fn color_schema(label: &str, path: &str) -> CollectionSchema {
    CollectionSchema::new(label, path)
        .field(FieldSpec::text("color_name").required())
        .field(FieldSpec::text("color_code").required())
        .field(FieldSpec::numeric("color_price").required())
        .update_policy(UpdatePolicy::PatchLocal)
        .search_scope(SearchScope::AllFields)
}

/// Frequently asked questions (`/sss`).
pub fn faqs() -> CollectionSchema {
    CollectionSchema::new("FAQ", "sss")
        .field(FieldSpec::text("title").required())
        .field(FieldSpec::text("text").required())
        .field(FieldSpec::text("slug").hidden())
        .field(FieldSpec::date("created_at").hidden())
}

/// Letter templates (`/schemas`).
pub fn letter_schemas() -> CollectionSchema {
    CollectionSchema::new("Schemas", "schemas")
        .field(FieldSpec::text("title").required())
        .field(FieldSpec::text("text").required())
        .field(FieldSpec::date("created_at"))
        .field(FieldSpec::date("updated_at").hidden())
        .search_scope(SearchScope::AllFields)
}

/// Product features shown on the landing page.
///
/// Listed at `/features`, changed through `/feature/{id}`.
pub fn features() -> CollectionSchema {
    CollectionSchema::new("Features", "features")
        .item_path("feature")
        .field(FieldSpec::text("feature_name").required())
        .field(FieldSpec::text("feature_logo").searchable(false))
        .field(FieldSpec::text("feature_description"))
        .field(FieldSpec::date("created_at").hidden())
        .field(FieldSpec::date("updated_at").hidden())
        .sort_by("feature_name", Direction::Ascending)
}

/// Envelope scents (`/envelope_smell`). The backend can only list and create.
pub fn envelope_smells() -> CollectionSchema {
    CollectionSchema::new("Envelope smells", "envelope_smell")
        .field(FieldSpec::text("smell_name").required())
        .field(FieldSpec::numeric("smell_price").required())
        .read_create_only()
}

/// Shipment options (`/shipment_type`). The backend can only list and create.
pub fn shipment_types() -> CollectionSchema {
    CollectionSchema::new("Shipment types", "shipment_type")
        .field(FieldSpec::text("type_name").required())
        .field(FieldSpec::text("type_description"))
        .field(FieldSpec::numeric("shipment_price").required())
        .read_create_only()
}

/// Site navigation entries (`/menu_links`).
pub fn menu_links() -> CollectionSchema {
    CollectionSchema::new("Menu links", "menu_links")
        .field(FieldSpec::text("menu_name").required())
        .field(FieldSpec::text("menu_url").required())
        .field(FieldSpec::text("target_window"))
        .field(FieldSpec::text("menu_group"))
        .field(FieldSpec::date("created_at").hidden())
        .field(FieldSpec::date("updated_at").hidden())
}

/// Content pages (`/content`). Slugs are derived from the title server-side.
pub fn content_pages() -> CollectionSchema {
    CollectionSchema::new("Content", "content")
        .field(FieldSpec::text("title").required())
        .field(FieldSpec::text("slug").read_only())
        .field(FieldSpec::text("text").required().hidden())
        .field(FieldSpec::text("main_photo").searchable(false).read_only().hidden())
        .field(FieldSpec::date("created_at"))
        .sort_by("title", Direction::Ascending)
}

/// Prisons letters can be addressed to (`/jails`).
pub fn jails() -> CollectionSchema {
    CollectionSchema::new("Jails", "jails")
        .field(FieldSpec::text("name").required())
        .field(FieldSpec::text("address").required())
        .field(FieldSpec::numeric("city_id").required())
        .field(FieldSpec::numeric("type").required())
        .sort_by("name", Direction::Ascending)
}

/// Cities (`/cities`), keyed by `city_id`.
pub fn cities() -> CollectionSchema {
    CollectionSchema::new("Cities", "cities")
        .id_field("city_id")
        .field(FieldSpec::text("city_name").required())
        .field(FieldSpec::numeric("plate_no").required())
        .field(FieldSpec::text("phone_code"))
        .field(FieldSpec::numeric("country_id").required().hidden())
        .sort_by(ID_FIELD, Direction::Ascending)
}

/// Every built-in collection.
pub fn all() -> Vec<CollectionSchema> {
    vec![
        prices(),
        envelope_colors(),
        paper_colors(),
        faqs(),
        letter_schemas(),
        features(),
        envelope_smells(),
        shipment_types(),
        menu_links(),
        content_pages(),
        jails(),
        cities(),
    ]
}

/// Looks up a built-in collection by path (`paper_colors`) or label (`Paper colors`).
pub fn find(name: &str) -> Option<CollectionSchema> {
    all().into_iter().find(|schema| {
        schema.path == name
            || schema.label.eq_ignore_ascii_case(name)
            || schema.path.replace('_', "-") == name
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_paths_are_unique() {
        let paths: HashSet<String> = all().into_iter().map(|s| s.path).collect();
        assert_eq!(paths.len(), all().len());
    }

    #[test]
    fn test_default_sort_fields_are_declared() {
        for schema in all() {
            assert!(
                schema.kind_of(&schema.default_sort.field).is_some(),
                "{} sorts by undeclared field {}",
                schema.path,
                schema.default_sort.field
            );
        }
    }

    #[test]
    fn test_find_accepts_path_label_and_dashes() {
        assert_eq!(find("sss").unwrap().label, "FAQ");
        assert_eq!(find("faq").unwrap().path, "sss");
        assert_eq!(find("paper-colors").unwrap().path, "paper_colors");
        assert!(find("orders").is_none());
    }

    #[test]
    fn test_find_accepts_plural_labels_of_singular_routes() {
        assert_eq!(find("envelope smells").unwrap().path, "envelope_smell");
        assert_eq!(find("shipment-type").unwrap().path, "shipment_type");
    }

    #[test]
    fn test_read_create_only_collections() {
        let fixed: Vec<String> = all()
            .into_iter()
            .filter(|s| !s.allows_changes())
            .map(|s| s.path)
            .collect();
        assert_eq!(fixed, ["envelope_smell", "shipment_type"]);
    }
}
