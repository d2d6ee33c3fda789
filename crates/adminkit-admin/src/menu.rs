//! Navigation menu.
//!
//! The menu is declared as a list of [`MenuEntry`] values: model resources
//! referenced by slug, external links, and dropdowns grouping either. It is
//! checked once when the app is built and rendered per request with the
//! entry for the current path marked active.

use std::sync::Arc;

use adminkit_core::{AdminError, AdminResult};
use serde::Serialize;

use crate::resource::ModelResource;

/// A navigation-only entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    label: String,
    icon: String,
    url: String,
    target: Option<String>,
}

impl Link {
    /// A link to `url`.
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: String::new(),
            url: url.into(),
            target: None,
        }
    }

    /// Sets the icon classes.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Sets the anchor `target`, e.g. `_blank`.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// A group of entries under one label. Dropdowns do not nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropdown {
    label: String,
    icon: String,
    entries: Vec<MenuEntry>,
}

impl Dropdown {
    /// A dropdown holding `entries`.
    pub fn new(label: impl Into<String>, entries: impl IntoIterator<Item = MenuEntry>) -> Self {
        Self {
            label: label.into(),
            icon: String::new(),
            entries: entries.into_iter().collect(),
        }
    }

    /// Sets the icon classes.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

/// One entry of the declared menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    /// A registered model resource, by slug.
    Model(String),
    /// An external or custom link.
    Link(Link),
    /// A group of entries.
    Dropdown(Dropdown),
}

impl MenuEntry {
    /// The model resource registered under `slug`.
    pub fn model(slug: impl Into<String>) -> Self {
        Self::Model(slug.into())
    }
}

impl From<Link> for MenuEntry {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

impl From<Dropdown> for MenuEntry {
    fn from(dropdown: Dropdown) -> Self {
        Self::Dropdown(dropdown)
    }
}

/// A menu entry as handed to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// `model`, `link` or `dropdown`.
    pub kind: &'static str,
    /// The text.
    pub label: String,
    /// Icon classes.
    pub icon: String,
    /// The target URL; empty for dropdowns.
    pub url: String,
    /// The anchor target.
    pub target: Option<String>,
    /// Whether the entry matches the current path.
    pub active: bool,
    /// Dropdown children.
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    fn mark_active(&mut self, path: &str) {
        for child in &mut self.children {
            child.mark_active(path);
        }
        self.active = if self.children.is_empty() {
            self.kind == "model" && is_under(path, &self.url)
        } else {
            self.children.iter().any(|c| c.active)
        };
    }
}

fn is_under(path: &str, url: &str) -> bool {
    let base = url.trim_end_matches("/list");
    path == base || path.starts_with(&format!("{base}/"))
}

/// The checked menu of an app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    items: Vec<MenuItem>,
}

impl Menu {
    /// Checks `entries` against the registered resources.
    ///
    /// Fails with `InvalidResource` for a slug that is not registered or a
    /// dropdown inside a dropdown.
    pub fn build(
        entries: &[MenuEntry],
        resources: &[Arc<ModelResource>],
        admin_url: impl Fn(&str) -> String,
    ) -> AdminResult<Self> {
        let items = entries
            .iter()
            .map(|entry| build_item(entry, resources, &admin_url, false))
            .collect::<AdminResult<Vec<_>>>()?;
        Ok(Self { items })
    }

    /// One model entry per resource, in registration order.
    pub fn from_resources(
        resources: &[Arc<ModelResource>],
        admin_url: impl Fn(&str) -> String,
    ) -> Self {
        let items = resources
            .iter()
            .map(|resource| model_item(resource, &admin_url))
            .collect();
        Self { items }
    }

    /// The entries with the one matching `path` marked active.
    pub fn items_for(&self, path: &str) -> Vec<MenuItem> {
        let mut items = self.items.clone();
        for item in &mut items {
            item.mark_active(path);
        }
        items
    }

    /// The entries without active marks.
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }
}

fn model_item(resource: &ModelResource, admin_url: &impl Fn(&str) -> String) -> MenuItem {
    MenuItem {
        kind: "model",
        label: resource.label().to_string(),
        icon: resource.icon().to_string(),
        url: admin_url(&format!("{}/list", resource.slug())),
        target: None,
        active: false,
        children: Vec::new(),
    }
}

fn build_item(
    entry: &MenuEntry,
    resources: &[Arc<ModelResource>],
    admin_url: &impl Fn(&str) -> String,
    nested: bool,
) -> AdminResult<MenuItem> {
    match entry {
        MenuEntry::Model(slug) => resources
            .iter()
            .find(|r| r.slug() == slug)
            .map(|resource| model_item(resource, admin_url))
            .ok_or_else(|| {
                AdminError::InvalidResource(format!("menu references unregistered resource '{slug}'"))
            }),
        MenuEntry::Link(link) => Ok(MenuItem {
            kind: "link",
            label: link.label.clone(),
            icon: link.icon.clone(),
            url: link.url.clone(),
            target: link.target.clone(),
            active: false,
            children: Vec::new(),
        }),
        MenuEntry::Dropdown(dropdown) => {
            if nested {
                return Err(AdminError::InvalidResource(format!(
                    "dropdown '{}' cannot be nested in another dropdown",
                    dropdown.label
                )));
            }
            let children = dropdown
                .entries
                .iter()
                .map(|child| build_item(child, resources, admin_url, true))
                .collect::<AdminResult<Vec<_>>>()?;
            Ok(MenuItem {
                kind: "dropdown",
                label: dropdown.label.clone(),
                icon: dropdown.icon.clone(),
                url: String::new(),
                target: None,
                active: false,
                children,
            })
        }
    }
}
