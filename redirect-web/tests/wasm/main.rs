#![cfg(target_arch = "wasm32")]

mod browser_ports_tests;
mod redirect_page_tests;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);
