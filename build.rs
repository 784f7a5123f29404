use std::{env, fs::File, path::PathBuf};

use gl_generator::{Api, DebugStructGenerator, Fallbacks, Profile, Registry, StructGenerator};

fn main() {
    let dest = PathBuf::from(&env::var("OUT_DIR").unwrap());

    println!("cargo:rerun-if-changed=build.rs");

    let mut file = File::create(dest.join("gl_bindings.rs")).unwrap();

    let registry = Registry::new(Api::Gl, (4, 6), Profile::Core, Fallbacks::None, []);
    if env::var_os("CARGO_FEATURE_DEBUG_GL_STRUCTS").is_some() {
        registry
            .write_bindings(DebugStructGenerator, &mut file)
            .unwrap();
    } else {
        registry.write_bindings(StructGenerator, &mut file).unwrap();
    }
}
