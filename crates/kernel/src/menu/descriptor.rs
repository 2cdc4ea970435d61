//! Menu item descriptors declared by modules.
//!
//! A descriptor is one routable target a module offers to the menu item
//! form. Which optional fields are populated depends on the descriptor's
//! `type`; fields that do not apply to a kind are simply absent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Route kinds understood by the dependent option lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Widget,
    Model,
    Action,
    Route,
}

impl RouteKind {
    /// All kinds, in the order they are offered in forms.
    pub const ALL: [RouteKind; 4] = [Self::Widget, Self::Model, Self::Action, Self::Route];

    /// Parse a declared kind. Unknown strings return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "widget" => Some(Self::Widget),
            "model" => Some(Self::Model),
            "action" => Some(Self::Action),
            "route" => Some(Self::Route),
            _ => None,
        }
    }

    /// Machine name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Widget => "widget",
            Self::Model => "model",
            Self::Action => "action",
            Self::Route => "route",
        }
    }
}

/// Which attributes of a model to expose as an option's id and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub id: String,
    pub name: String,
}

/// One routable target declared by a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemDescriptor {
    /// Menu type this entry belongs to (e.g. "web", "mobile").
    pub menu: String,

    /// Declared route kind. Kept verbatim so undeclared kinds still show up
    /// in the route type listing.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// Routing path (`model` and `action` kinds).
    #[serde(default)]
    pub route: Option<String>,

    /// Entity class name (`model` kind).
    #[serde(default)]
    pub class: Option<String>,

    /// Projected attributes (`model` kind).
    #[serde(default)]
    pub field: Option<FieldMapping>,

    /// Route key -> display name, in declaration order (`route` kind).
    #[serde(default)]
    pub routes: Option<IndexMap<String, String>>,
}

/// Entity type a module exposes for model-bound options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDeclaration {
    /// Class name referenced by `model` descriptors.
    pub class: String,
    /// Backing table.
    pub table: String,
    /// Columns that may be projected as option id or name.
    pub columns: Vec<String>,
}

/// Everything a module declares for the menu system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleCatalog {
    /// Module machine name.
    pub name: String,

    #[serde(default)]
    pub items: Vec<MenuItemDescriptor>,

    #[serde(default)]
    pub entities: Vec<EntityDeclaration>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn route_kind_parse_known_and_unknown() {
        for kind in RouteKind::ALL {
            assert_eq!(RouteKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RouteKind::parse("url"), None);
        assert_eq!(RouteKind::parse("Widget"), None);
    }

    #[test]
    fn descriptor_keeps_unknown_kind() {
        let d: MenuItemDescriptor =
            serde_json::from_str(r#"{"menu": "web", "type": "url"}"#).unwrap();
        assert_eq!(d.kind, "url");
        assert!(RouteKind::parse(&d.kind).is_none());
        assert!(d.routes.is_none());
    }

    #[test]
    fn routes_keep_declaration_order() {
        let d: MenuItemDescriptor = serde_json::from_str(
            r#"{"menu": "web", "type": "route", "routes": {"z": "Zed", "a": "Alpha"}}"#,
        )
        .unwrap();
        let keys: Vec<_> = d.routes.unwrap().into_keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
