mod sizer;

pub use sizer::measure;
