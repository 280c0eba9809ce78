#[macro_export]
macro_rules! kmap {
    ($($key:expr => $val:expr),*$(,)?) => {
        BTreeMap::<String, String>::from([$(($key.to_string(), $val.to_string())),*])
    };
}

pub use std::collections::BTreeMap;

pub use kmap;
