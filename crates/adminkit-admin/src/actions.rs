//! List-page actions.
//!
//! Toolbar actions sit above the table, row actions at the end of each row,
//! and bulk actions under the table, applied to the selected rows. Each
//! action points at `{resource}/{name}`; row actions append the primary key
//! and bulk actions append `?ids=`.

use std::fmt;

use adminkit_widgets::RenderContext;
use serde::{Deserialize, Serialize};

/// The HTTP method an action is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`, usually a plain navigation.
    Get,
    /// `POST`.
    Post,
    /// `PUT`.
    Put,
    /// `PATCH`.
    Patch,
    /// `DELETE`.
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

/// A row or bulk action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The button text.
    pub label: String,
    /// Icon CSS classes.
    pub icon: String,
    /// The route segment after the resource.
    pub name: String,
    /// The HTTP method.
    pub method: HttpMethod,
    /// Whether the action is sent in the background instead of navigated to.
    pub ajax: bool,
}

impl Action {
    /// A background action.
    pub fn new(label: impl Into<String>, name: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            label: label.into(),
            icon: String::new(),
            name: name.into(),
            method,
            ajax: true,
        }
    }

    /// Sets the icon classes.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Sets whether the action runs in the background.
    #[must_use]
    pub const fn ajax(mut self, ajax: bool) -> Self {
        self.ajax = ajax;
        self
    }
}

/// An action shown in the list toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolbarAction {
    /// The action.
    #[serde(flatten)]
    pub action: Action,
    /// Button CSS classes.
    pub class: String,
}

impl ToolbarAction {
    /// A toolbar button for `action`.
    pub fn new(action: Action, class: impl Into<String>) -> Self {
        Self {
            action,
            class: class.into(),
        }
    }
}

/// An action as handed to the list template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionView {
    /// The button text.
    pub label: String,
    /// Icon CSS classes.
    pub icon: String,
    /// The route segment.
    pub name: String,
    /// The HTTP method.
    pub method: HttpMethod,
    /// Whether the action is sent in the background.
    pub ajax: bool,
    /// Button CSS classes.
    pub class: String,
    /// The target URL, without row key or ids.
    pub url: String,
}

impl ActionView {
    /// Resolves `action` against the resource URL.
    pub fn new(action: &Action, resource_url: &str, class: &str) -> Self {
        Self {
            label: action.label.clone(),
            icon: action.icon.clone(),
            name: action.name.clone(),
            method: action.method,
            ajax: action.ajax,
            class: class.to_string(),
            url: format!("{resource_url}/{}", action.name),
        }
    }

    /// Resolves a toolbar action against the resource URL.
    pub fn toolbar(action: &ToolbarAction, resource_url: &str) -> Self {
        Self::new(&action.action, resource_url, &action.class)
    }
}

/// The default toolbar: a `create` button.
pub fn default_toolbar_actions(cx: &RenderContext<'_>) -> Vec<ToolbarAction> {
    vec![ToolbarAction::new(
        Action::new(cx.t("create"), "create", HttpMethod::Get)
            .icon("fas fa-plus")
            .ajax(false),
        "btn-dark",
    )]
}

/// The default row actions: `update` and `delete`.
pub fn default_actions(cx: &RenderContext<'_>) -> Vec<Action> {
    vec![
        Action::new(cx.t("update"), "update", HttpMethod::Get)
            .icon("ti ti-edit")
            .ajax(false),
        Action::new(cx.t("delete"), "delete", HttpMethod::Delete).icon("ti ti-trash"),
    ]
}

/// The default bulk action: delete the selected rows.
pub fn default_bulk_actions(cx: &RenderContext<'_>) -> Vec<Action> {
    vec![Action::new(cx.t("delete_selected"), "delete", HttpMethod::Delete).icon("ti ti-trash")]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adminkit_core::i18n::I18nTranslator;
    use adminkit_template::Templates;

    use super::*;

    #[test]
    fn test_defaults() {
        let templates = Templates::new(Arc::new(I18nTranslator::builder().build().unwrap())).unwrap();
        let cx = RenderContext::new(&templates, "en");

        let toolbar = default_toolbar_actions(&cx);
        assert_eq!(toolbar[0].action.name, "create");
        assert_eq!(toolbar[0].class, "btn-dark");
        assert!(!toolbar[0].action.ajax);

        let actions = default_actions(&cx);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].method, HttpMethod::Get);
        assert_eq!(actions[1].method, HttpMethod::Delete);
        assert!(actions[1].ajax);

        let bulk = default_bulk_actions(&cx);
        assert_eq!(bulk[0].name, "delete");
        assert_eq!(bulk[0].label, cx.t("delete_selected"));
    }

    #[test]
    fn test_view_url() {
        let action = Action::new("Switch", "switch_status", HttpMethod::Put);
        let view = ActionView::new(&action, "/admin/config", "");
        assert_eq!(view.url, "/admin/config/switch_status");
        assert_eq!(serde_json::to_value(&view).unwrap()["method"], "PUT");
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
