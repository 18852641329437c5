use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Attribute {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AttributeQuery {
    pub category_id: Option<Uuid>,
}

/// A category together with the attributes that can be toggled under it.
#[derive(Debug, Serialize)]
pub struct CategoryGroup {
    pub id: Uuid,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

/// Groups attributes under their categories, keeping category order.
/// Categories without attributes are left out.
pub fn group_by_category(categories: Vec<Category>, attributes: Vec<Attribute>) -> Vec<CategoryGroup> {
    let mut by_category: HashMap<Uuid, Vec<Attribute>> = HashMap::new();
    for attr in attributes {
        by_category.entry(attr.category_id).or_default().push(attr);
    }

    categories
        .into_iter()
        .filter_map(|category| {
            let attributes = by_category.remove(&category.id)?;
            Some(CategoryGroup {
                id: category.id,
                name: category.name,
                attributes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    fn attribute(category: &Category, name: &str) -> Attribute {
        Attribute {
            id: Uuid::new_v4(),
            category_id: category.id,
            name: name.into(),
        }
    }

    #[test]
    fn test_group_keeps_category_order() {
        let weather = category("weather");
        let meals = category("meals");
        let attrs = vec![
            attribute(&meals, "lunch"),
            attribute(&weather, "sunny"),
            attribute(&meals, "dinner"),
        ];

        let groups = group_by_category(vec![weather.clone(), meals.clone()], attrs);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "weather");
        assert_eq!(groups[0].attributes.len(), 1);
        assert_eq!(groups[1].name, "meals");
        let names: Vec<&str> = groups[1].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["lunch", "dinner"]);
    }

    #[test]
    fn test_group_skips_empty_categories() {
        let beauty = category("beauty");
        let chores = category("chores");
        let attrs = vec![attribute(&chores, "laundry")];

        let groups = group_by_category(vec![beauty, chores], attrs);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "chores");
    }

    #[test]
    fn test_group_drops_orphan_attributes() {
        let orphan_parent = category("gone");
        let attrs = vec![attribute(&orphan_parent, "stray")];
        assert!(group_by_category(Vec::new(), attrs).is_empty());
    }
}
