pub mod histogram;
pub mod slabs;
