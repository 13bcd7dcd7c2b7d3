pub mod wasm_api;

#[cfg(feature = "render")]
pub mod hooks;
