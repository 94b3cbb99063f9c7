//! Generates Swift and Kotlin bindings for `passcode-core`.

fn main() {
    uniffi::uniffi_bindgen_main();
}
