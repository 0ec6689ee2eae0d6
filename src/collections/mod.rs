//! Typed lists and string-keyed maps.
//!
//! Every collection is a self-delimiting object:
//!
//! ```text
//! list = varint(byte_list_length(size)) ++ varint(count << 2 | scheme) ++ element*
//! map  = varint(byte_list_length(size)) ++ string list body ++ value list body
//! ```
//!
//! The count's scheme is the element's wire type, so a reader can tell a list
//! of doubles from a list of longs before touching the elements.

mod element;
mod list;
mod map;

pub use element::{
    BoolElements, ByteElements, DoubleElements, ElementCodec, FloatElements, IntElements,
    LongElements, ShortElements, StringElements, StructElements,
};
pub use list::{
    BooleanList, ByteList, DoubleList, FloatList, IntList, List, LongList, ShortList, StringList,
    StructList,
};
pub use map::{
    BooleanMap, ByteMap, DoubleMap, FloatMap, IntMap, LongMap, Map, ShortMap, StringMap,
    StructMap,
};
