// Service layer between HTTP handlers and the engine/stores

mod definition;

pub use definition::DefinitionService;
