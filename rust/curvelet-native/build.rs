use std::{env, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=cpp");
    println!("cargo:rerun-if-env-changed=FDCT");
    println!("cargo:rerun-if-env-changed=FFTW");

    if env::var_os("CARGO_FEATURE_CURVELAB").is_none() {
        return;
    }

    let fdct = PathBuf::from(
        env::var("FDCT").expect("FDCT must point at the CurveLab root to build with `curvelab`"),
    );
    let fftw = PathBuf::from(
        env::var("FFTW").expect("FFTW must point at the FFTW 2.1.5 root to build with `curvelab`"),
    );
    let wrapping_src = fdct.join("fdct_wrapping_cpp").join("src");
    let fdct3d_src = fdct.join("fdct3d").join("src");
    let fftw_include = fftw.join("fftw");

    cc::Build::new()
        .cpp(true)
        .flag_if_supported("-std=c++11")
        .include("cpp")
        .file("cpp/shim_common.cpp")
        .compile("curvelet_shim_common");

    cc::Build::new()
        .cpp(true)
        .flag_if_supported("-std=c++11")
        .include("cpp")
        .include(&fftw_include)
        .include(&wrapping_src)
        .file("cpp/shim2d.cpp")
        .compile("curvelet_shim2d");

    cc::Build::new()
        .cpp(true)
        .flag_if_supported("-std=c++11")
        .include("cpp")
        .include(&fftw_include)
        .include(&fdct3d_src)
        .file("cpp/shim3d.cpp")
        .compile("curvelet_shim3d");

    println!("cargo:rustc-link-search=native={}", wrapping_src.display());
    println!("cargo:rustc-link-lib=static=fdct_wrapping");
    println!("cargo:rustc-link-search=native={}", fdct3d_src.display());
    println!("cargo:rustc-link-lib=static=fdct3d");
    println!(
        "cargo:rustc-link-search=native={}",
        fftw_include.join(".libs").display()
    );
    println!("cargo:rustc-link-lib=fftw");
}
