//! Services bundled with the daemon

mod echo;
mod widget;

pub use echo::EchoService;
pub use widget::{WidgetService, EDIT_WIDGETS_PERMISSION, GADGET_TYPE, WIDGET_TYPE};

use std::sync::Arc;
use switchboard_core::port::InMemoryServiceLocator;
use switchboard_infra_sqlite::SqliteEntityRepository;

/// Locator holding every bundled service
pub fn locator(entities: Arc<SqliteEntityRepository>) -> InMemoryServiceLocator {
    InMemoryServiceLocator::new()
        .register(Arc::new(EchoService::new()))
        .register(Arc::new(WidgetService::new(entities)))
}
