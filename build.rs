//! Build script reporting whether the system OpenCV needed by the `opencv`
//! crate can be found, with installation hints when it cannot.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    if !pkg_config_available() {
        println!("cargo:warning=pkg-config not found; set OPENCV_LINK_PATHS and OPENCV_INCLUDE_PATHS manually.");
        return;
    }

    match ["opencv4", "opencv"].iter().find_map(|name| opencv_version(name)) {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. calib3d, highgui, imgcodecs and imgproc are required.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev clang libclang-dev");
            println!("cargo:warning=On macOS: brew install opencv");
        }
    }
}

fn pkg_config_available() -> bool {
    Command::new("pkg-config")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

fn opencv_version(package: &str) -> Option<String> {
    let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
