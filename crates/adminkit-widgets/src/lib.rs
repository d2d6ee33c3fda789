//! # adminkit-widgets
//!
//! The rendering units of the admin panel.
//!
//! A [`Widget`] pairs a template name with a context map. Display widgets
//! render cell values on list pages, input widgets render and parse form
//! controls, and filters render list filters and turn query values into
//! backend-neutral [`FilterClause`](clause::FilterClause)s.
//!
//! ## Modules
//!
//! - [`widget`] - The [`Widget`] core and [`RenderContext`]
//! - [`displays`] - Read-only cell renderers
//! - [`inputs`] - Form controls and value parsing
//! - [`filters`] - List filters
//! - [`clause`] - Filter clauses and the [`FilterableQuery`](clause::FilterableQuery) seam
//! - [`options`] - Option sources for selects

pub mod clause;
pub mod displays;
pub mod filters;
pub mod inputs;
pub mod options;
pub mod widget;

pub use clause::{Condition, FilterClause, FilterableQuery, TextMatch};
pub use displays::{Display, DisplayType};
pub use filters::{Filter, FilterType};
pub use inputs::{Input, InputType};
pub use options::{OptionsSource, StaticOptions};
pub use widget::{RenderContext, Widget};
