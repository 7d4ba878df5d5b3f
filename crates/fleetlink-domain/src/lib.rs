//! Domain layer: collaborator traits and the association reconciler

pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
