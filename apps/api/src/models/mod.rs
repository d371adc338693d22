pub mod company;
pub mod offer;
pub mod template;
