pub mod halftone;
pub mod headers;
pub mod image_proxy;

pub use halftone::{handle_halftone, HalftoneQuery, __path_handle_halftone};
pub use image_proxy::{
    handle_image_proxy, handle_image_proxy_preflight, handle_method_not_allowed, ProxyQuery,
    __path_handle_image_proxy, __path_handle_image_proxy_preflight,
};
