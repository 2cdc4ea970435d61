//! Menu item form values, validation, and view-model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::menu::RouteKind;
use crate::models::menu_item::DEFAULT_STYLE;
use crate::models::{CreateMenuItem, MenuItem, UpdateMenuItem};

/// Maximum length of label and slug, in characters.
const MAX_TEXT_LEN: usize = 255;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field name (None for form-level errors).
    pub field: Option<String>,

    /// Error message.
    pub message: String,
}

impl ValidationError {
    /// Create a field-level error.
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
            message: message.into(),
        }
    }
}

/// Raw menu item form submission.
///
/// Every field is kept as text so bad input turns into a field error
/// rather than an extractor rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItemForm {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub slug: String,
    pub parent_id: Option<String>,
    pub module: Option<String>,
    pub route_type: Option<String>,
    pub route: Option<String>,
    pub model_id: Option<String>,
    pub menu_route_id: Option<String>,
    pub style: Option<String>,
    pub sort: Option<String>,
}

/// Menu item values that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMenuItem {
    pub parent_id: Option<Uuid>,
    pub label: String,
    pub slug: String,
    pub module: Option<String>,
    pub route_type: Option<String>,
    pub route: Option<String>,
    pub model_id: Option<String>,
    pub menu_route_id: Option<String>,
    pub style: Option<serde_json::Value>,
    pub sort: Option<i32>,
}

/// Trimmed value, or `None` when missing or blank.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl MenuItemForm {
    /// Defaults for a blank create form.
    pub fn blank() -> Self {
        Self {
            style: Some(DEFAULT_STYLE.to_string()),
            sort: Some("0".to_string()),
            ..Default::default()
        }
    }

    /// Current values of an existing item.
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            label: item.label.clone(),
            slug: item.slug.clone(),
            parent_id: item.parent_id.map(|id| id.to_string()),
            module: item.module.clone(),
            route_type: item.route_type.clone(),
            route: item.route.clone(),
            model_id: item.model_id.clone(),
            menu_route_id: item.menu_route_id.clone(),
            style: Some(item.style.to_string()),
            sort: Some(item.sort.to_string()),
        }
    }

    /// Validate the submission, collecting every field error.
    pub fn validate(&self) -> Result<ValidMenuItem, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let label = self.label.trim().to_string();
        if label.is_empty() {
            errors.push(ValidationError::field("label", "Label is required."));
        } else if label.chars().count() > MAX_TEXT_LEN {
            errors.push(ValidationError::field(
                "label",
                format!("Label must be at most {MAX_TEXT_LEN} characters."),
            ));
        }

        let mut slug = self.slug.trim().to_string();
        if slug.is_empty() {
            slug = slugify(&label);
        }
        if slug.is_empty() {
            if !label.is_empty() {
                errors.push(ValidationError::field(
                    "slug",
                    "Slug could not be derived from the label.",
                ));
            }
        } else if !is_valid_slug(&slug) {
            errors.push(ValidationError::field(
                "slug",
                "Slug may only contain lowercase letters, digits, and hyphens.",
            ));
        } else if slug.chars().count() > MAX_TEXT_LEN {
            errors.push(ValidationError::field(
                "slug",
                format!("Slug must be at most {MAX_TEXT_LEN} characters."),
            ));
        }

        let module = present(&self.module);
        let route_type = present(&self.route_type);
        let route = present(&self.route);

        if let Some(kind) = route_type.as_deref() {
            match RouteKind::parse(kind) {
                None => errors.push(ValidationError::field(
                    "route_type",
                    format!("Unknown route type '{kind}'."),
                )),
                Some(kind) => {
                    if kind != RouteKind::Widget && route.is_none() {
                        errors.push(ValidationError::field(
                            "route",
                            format!("Route is required for {} items.", kind.as_str()),
                        ));
                    }
                }
            }
            if module.is_none() {
                errors.push(ValidationError::field(
                    "module",
                    "Module is required when a route type is chosen.",
                ));
            }
        }

        let parent_id = match present(&self.parent_id) {
            None => None,
            Some(raw) => match raw.parse::<Uuid>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(ValidationError::field("parent_id", "Invalid parent item."));
                    None
                }
            },
        };

        let style = match present(&self.style) {
            None => None,
            Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) if value.is_object() => Some(value),
                _ => {
                    errors.push(ValidationError::field(
                        "style",
                        "Style must be a JSON object.",
                    ));
                    None
                }
            },
        };

        let sort = match present(&self.sort) {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(n) => Some(n),
                Err(_) => {
                    errors.push(ValidationError::field("sort", "Sort must be an integer."));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidMenuItem {
            parent_id,
            label,
            slug,
            module,
            route_type,
            route,
            model_id: present(&self.model_id),
            menu_route_id: present(&self.menu_route_id),
            style,
            sort,
        })
    }
}

impl ValidMenuItem {
    /// Creation input for a new item in `menu_id` owned by `owner_id`.
    pub fn into_create(self, menu_id: Uuid, owner_id: Uuid) -> CreateMenuItem {
        CreateMenuItem {
            menu_id,
            parent_id: self.parent_id,
            label: self.label,
            slug: self.slug,
            module: self.module,
            route_type: self.route_type,
            route: self.route,
            model_id: self.model_id,
            menu_route_id: self.menu_route_id,
            style: self.style,
            sort: self.sort,
            owner_id,
        }
    }

    /// Update input replacing every submitted field.
    ///
    /// Style and sort are left unchanged when not submitted.
    pub fn into_update(self) -> UpdateMenuItem {
        UpdateMenuItem {
            menu_id: None,
            parent_id: Some(self.parent_id),
            label: Some(self.label),
            slug: Some(self.slug),
            module: Some(self.module),
            route_type: Some(self.route_type),
            route: Some(self.route),
            model_id: Some(self.model_id),
            menu_route_id: Some(self.menu_route_id),
            style: self.style,
            sort: self.sort,
        }
    }
}

/// Data the admin UI needs to render the create/update form.
#[derive(Debug, Clone, Serialize)]
pub struct MenuItemFormView {
    /// Where the form posts to.
    pub action: String,
    pub menu_id: Uuid,
    /// Set when editing an existing item.
    pub item_id: Option<Uuid>,
    pub values: MenuItemForm,
    /// Registered module names for the module dropdown.
    pub modules: Vec<String>,
    pub route_types: Vec<&'static str>,
    pub errors: Vec<ValidationError>,
}

impl MenuItemFormView {
    pub fn new(
        action: String,
        menu_id: Uuid,
        item_id: Option<Uuid>,
        values: MenuItemForm,
        modules: Vec<String>,
    ) -> Self {
        Self {
            action,
            menu_id,
            item_id,
            values,
            modules,
            route_types: RouteKind::ALL.iter().map(RouteKind::as_str).collect(),
            errors: Vec::new(),
        }
    }

    /// Attach validation errors.
    pub fn with_errors(mut self, errors: Vec<ValidationError>) -> Self {
        self.errors = errors;
        self
    }
}

/// Convert text into a slug.
///
/// Lowercases, replaces non-alphanumeric characters with hyphens, collapses
/// runs of hyphens, and trims them from both ends.
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_hyphen = true;
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    if result.len() > MAX_TEXT_LEN {
        // Pure ASCII, so byte length is char length
        result.truncate(MAX_TEXT_LEN);
        while result.ends_with('-') {
            result.pop();
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn form(label: &str) -> MenuItemForm {
        MenuItemForm {
            label: label.to_string(),
            ..Default::default()
        }
    }

    fn fields(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().filter_map(|e| e.field.as_deref()).collect()
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  --Shop & Cart!! "), "shop-cart");
        assert_eq!(slugify("Über"), "ber");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_truncates() {
        let long = "a".repeat(300);
        assert_eq!(slugify(&long).len(), MAX_TEXT_LEN);
    }

    #[test]
    fn minimal_form_is_valid_and_derives_slug() {
        let valid = form("About Us").validate().unwrap();
        assert_eq!(valid.label, "About Us");
        assert_eq!(valid.slug, "about-us");
        assert_eq!(valid.route_type, None);
        assert_eq!(valid.style, None);
    }

    #[test]
    fn label_is_required() {
        let errors = form("   ").validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["label"]);
    }

    #[test]
    fn label_length_is_limited() {
        let errors = form(&"x".repeat(256)).validate().unwrap_err();
        assert!(fields(&errors).contains(&"label"));
    }

    #[test]
    fn explicit_slug_must_be_clean() {
        let mut f = form("Home");
        f.slug = "Home Page".to_string();
        let errors = f.validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["slug"]);
    }

    #[test]
    fn underivable_slug_is_reported() {
        let errors = form("???").validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["slug"]);
    }

    #[test]
    fn route_type_requires_module_and_route() {
        let mut f = form("Items");
        f.route_type = Some("model".to_string());
        let errors = f.validate().unwrap_err();
        let names = fields(&errors);
        assert!(names.contains(&"module"));
        assert!(names.contains(&"route"));
    }

    #[test]
    fn widget_needs_no_route() {
        let mut f = form("Latest");
        f.route_type = Some("widget".to_string());
        f.module = Some("catalog".to_string());
        assert!(f.validate().is_ok());
    }

    #[test]
    fn unknown_route_type_is_rejected() {
        let mut f = form("Elsewhere");
        f.route_type = Some("url".to_string());
        f.module = Some("catalog".to_string());
        let errors = f.validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["route_type"]);
    }

    #[test]
    fn style_must_be_an_object() {
        let mut f = form("Styled");
        f.style = Some("[1, 2]".to_string());
        assert_eq!(fields(&f.validate().unwrap_err()), vec!["style"]);

        f.style = Some(r#"{"icon":"0xf0f6"}"#.to_string());
        let valid = f.validate().unwrap();
        assert_eq!(valid.style.unwrap()["icon"], "0xf0f6");
    }

    #[test]
    fn sort_and_parent_are_parsed() {
        let mut f = form("Child");
        f.sort = Some("x".to_string());
        f.parent_id = Some("not-a-uuid".to_string());
        let errors = f.validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["parent_id", "sort"]);

        let parent = Uuid::now_v7();
        f.sort = Some(" -3 ".to_string());
        f.parent_id = Some(parent.to_string());
        let valid = f.validate().unwrap();
        assert_eq!(valid.sort, Some(-3));
        assert_eq!(valid.parent_id, Some(parent));
    }

    #[test]
    fn blank_values_become_none() {
        let mut f = form("Home");
        f.module = Some("  ".to_string());
        f.model_id = Some(String::new());
        let valid = f.validate().unwrap();
        assert_eq!(valid.module, None);
        assert_eq!(valid.model_id, None);
    }

    #[test]
    fn into_update_replaces_submitted_fields() {
        let mut f = form("Home");
        f.route = Some("/".to_string());
        let update = f.validate().unwrap().into_update();
        assert_eq!(update.label.as_deref(), Some("Home"));
        assert_eq!(update.route, Some(Some("/".to_string())));
        assert_eq!(update.module, Some(None));
        assert!(update.style.is_none());
        assert!(update.menu_id.is_none());
    }

    #[test]
    fn blank_form_carries_default_style() {
        let blank = MenuItemForm::blank();
        let style: serde_json::Value =
            serde_json::from_str(blank.style.as_deref().unwrap()).unwrap();
        assert_eq!(style["color"], "rgb(234, 153, 153)");
    }

    #[test]
    fn view_lists_route_types() {
        let view = MenuItemFormView::new(
            "/menu/item/create".to_string(),
            Uuid::nil(),
            None,
            MenuItemForm::blank(),
            vec!["menu".to_string()],
        );
        assert_eq!(view.route_types, vec!["widget", "model", "action", "route"]);
        assert!(view.errors.is_empty());
    }
}
