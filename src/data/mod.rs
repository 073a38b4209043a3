mod model;

pub use model::InitialData;
