pub mod books;

use std::sync::Arc;

use bookshelf_kernel::settings::Settings;
use bookshelf_kernel::ModuleRegistry;

use books::store::MongoBookStore;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &mongodb::Database, settings: &Settings) {
    let store = Arc::new(MongoBookStore::new(db, &settings.database.collection));
    registry.register(books::create_module(store));
}
