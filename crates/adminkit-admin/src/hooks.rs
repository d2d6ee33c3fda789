//! Per-resource customization of the list page.

use std::collections::BTreeMap;

use adminkit_widgets::RenderContext;
use async_trait::async_trait;

use crate::actions::{self, Action, ToolbarAction};
use crate::backend::Row;
use crate::field::Field;

/// HTML attributes of a row, column header or cell.
pub type Attributes = BTreeMap<String, String>;

/// Overrides for the list page of one resource.
///
/// Every method has a default: no attributes and the standard actions.
///
/// ```
/// use adminkit_admin::backend::Row;
/// use adminkit_admin::hooks::{Attributes, ResourceHooks};
/// use adminkit_widgets::RenderContext;
/// use async_trait::async_trait;
///
/// struct HighlightDisabled;
///
/// #[async_trait]
/// impl ResourceHooks for HighlightDisabled {
///     async fn row_attributes(&self, _cx: &RenderContext<'_>, row: &Row) -> Attributes {
///         let mut attributes = Attributes::new();
///         if row.get("status").and_then(|v| v.as_i64()) == Some(0) {
///             attributes.insert("class".into(), "bg-red-lt".into());
///         }
///         attributes
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceHooks: Send + Sync {
    /// Attributes of the `<tr>` showing `row`.
    async fn row_attributes(&self, _cx: &RenderContext<'_>, _row: &Row) -> Attributes {
        Attributes::new()
    }

    /// Attributes of the `<th>` of `field`.
    async fn column_attributes(&self, _cx: &RenderContext<'_>, _field: &Field) -> Attributes {
        Attributes::new()
    }

    /// Attributes of the `<td>` showing `field` of `row`.
    async fn cell_attributes(
        &self,
        _cx: &RenderContext<'_>,
        _row: &Row,
        _field: &Field,
    ) -> Attributes {
        Attributes::new()
    }

    /// Buttons above the table.
    async fn toolbar_actions(&self, cx: &RenderContext<'_>) -> Vec<ToolbarAction> {
        actions::default_toolbar_actions(cx)
    }

    /// Buttons on each row.
    async fn actions(&self, cx: &RenderContext<'_>) -> Vec<Action> {
        actions::default_actions(cx)
    }

    /// Buttons applied to the selected rows.
    async fn bulk_actions(&self, cx: &RenderContext<'_>) -> Vec<Action> {
        actions::default_bulk_actions(cx)
    }
}

/// The standard list page.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl ResourceHooks for DefaultHooks {}
