#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|source: String| {
    if edge_py::is_script_path(&source) {
        return;
    }

    let Ok(once) = edge_py::normalize(&source) else {
        panic!("inline sources are never read from disk");
    };
    assert_eq!(edge_py::normalize(&once).ok(), Some(once));
});
