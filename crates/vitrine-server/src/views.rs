//! Server-rendered pages.

use askama::Template;
use axum::response::Html;
use vitrine_core::{Error, Result};
use vitrine_db::models::ImageRecord;

use crate::catalog::active_filter;

/// One entry in the brand filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandOption {
    pub name: String,
    pub selected: bool,
}

/// Catalog listing with the brand filter.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub images: Vec<ImageRecord>,
    pub brands: Vec<BrandOption>,
    /// Active filter, empty when showing everything.
    pub filter: String,
}

impl IndexTemplate {
    pub fn new(images: Vec<ImageRecord>, brands: Vec<String>, filter: Option<&str>) -> Self {
        let filter = active_filter(filter).unwrap_or_default().to_string();
        let brands = brands
            .into_iter()
            .map(|name| BrandOption {
                selected: name == filter,
                name,
            })
            .collect();
        Self {
            images,
            brands,
            filter,
        }
    }
}

#[derive(Template)]
#[template(path = "add.html")]
pub struct AddTemplate;

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate {
    pub image: ImageRecord,
}

/// Render a template into an HTML response.
pub fn render<T: Template>(template: &T) -> Result<Html<String>> {
    template
        .render()
        .map(Html)
        .map_err(|e| Error::Internal(format!("Template rendering failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, title: &str, brand: &str) -> ImageRecord {
        ImageRecord {
            id,
            title: title.into(),
            brand: brand.into(),
            image_path: format!("/uploads/{id}_a.jpg"),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn index_marks_selected_brand() {
        let page = IndexTemplate::new(
            vec![record(1, "A", "Acme")],
            vec!["Acme".into(), "Globex".into()],
            Some("Globex"),
        );
        assert!(!page.brands[0].selected);
        assert!(page.brands[1].selected);

        let html = render(&page).unwrap().0;
        assert!(html.contains(r#"<option value="Globex" selected>"#));
        assert!(html.contains("1_a.jpg"));
    }

    #[test]
    fn padded_filter_selects_nothing() {
        let page = IndexTemplate::new(vec![], vec!["Acme".into()], Some(" Acme "));
        assert_eq!(page.filter, " Acme ");
        assert!(!page.brands[0].selected);

        let page = IndexTemplate::new(vec![], vec!["Acme".into()], Some("  "));
        assert_eq!(page.filter, "");
    }

    #[test]
    fn index_escapes_user_text() {
        let page = IndexTemplate::new(vec![record(1, "<script>", "Acme")], vec![], None);
        let html = render(&page).unwrap().0;
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_listing() {
        let html = render(&IndexTemplate::new(vec![], vec![], None)).unwrap().0;
        assert!(html.contains("No images"));
    }

    #[test]
    fn edit_prefills_fields() {
        let html = render(&EditTemplate {
            image: record(7, "Model A", "Acme"),
        })
        .unwrap()
        .0;
        assert!(html.contains(r#"action="/edit/7""#));
        assert!(html.contains(r#"value="Model A""#));
    }

    #[test]
    fn add_form_is_multipart() {
        let html = render(&AddTemplate).unwrap().0;
        assert!(html.contains(r#"enctype="multipart/form-data""#));
        assert!(html.contains(r#"name="image""#));
    }
}
