//! Entry point for objlit: logging + CLI flags -> platform::ViewerConfig.

use std::path::PathBuf;

use anyhow::{Result, bail};
use corelib::Vec3;
use platform::ViewerConfig;

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_show_fps_arg(args: &[String]) -> bool {
    // --show-fps[=on|off], off by default
    for arg in args {
        if arg == "--show-fps" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-fps=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(1280).max(1);
    let hh = h.unwrap_or(720).max(1);
    (ww, hh)
}

fn parse_vec3(v: &str) -> Option<Vec3> {
    let mut parts = v.split(',').map(|p| p.trim().parse::<f32>());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Some(Vec3::new(x, y, z)),
        _ => None,
    }
}

/// --obj, --fov, --eye, --orbit, --headless-frames. Malformed values are errors.
fn parse_scene_args(args: &[String], config: &mut ViewerConfig) -> Result<()> {
    for arg in args {
        if let Some(v) = arg.strip_prefix("--obj=") {
            config.obj_path = Some(PathBuf::from(v));
        } else if let Some(v) = arg.strip_prefix("--fov=") {
            match v.parse::<f32>() {
                Ok(fov) => config.camera.fov_y_deg = fov,
                Err(_) => bail!("invalid --fov value '{v}'"),
            }
        } else if let Some(v) = arg.strip_prefix("--eye=") {
            match parse_vec3(v) {
                Some(eye) => config.camera.eye = eye,
                None => bail!("invalid --eye value '{v}', expected x,y,z"),
            }
        } else if let Some(v) = arg.strip_prefix("--orbit=") {
            match v.parse::<f32>() {
                Ok(speed) => config.orbit_deg_per_sec = speed,
                Err(_) => bail!("invalid --orbit value '{v}'"),
            }
        } else if let Some(v) = arg.strip_prefix("--headless-frames=") {
            match v.parse::<u64>() {
                Ok(n) => config.headless_frames = Some(n),
                Err(_) => bail!("invalid --headless-frames value '{v}'"),
            }
        }
    }
    Ok(())
}

fn parse_config(args: &[String]) -> Result<ViewerConfig> {
    let (width, height) = parse_size_args(args);
    let mut config = ViewerConfig {
        backends: parse_backend_arg(args),
        show_fps: parse_show_fps_arg(args),
        width,
        height,
        ..Default::default()
    };
    parse_scene_args(args, &mut config)?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_config(&args)?;
    log::info!(
        "Starting objlit. Backend: {:?}, show_fps={}, window_size={}x{}, obj={}",
        config.backends,
        config.show_fps,
        config.width,
        config.height,
        config
            .obj_path
            .as_ref()
            .map_or_else(|| "<bundled cube>".to_owned(), |p| p.display().to_string())
    );

    platform::run_viewer(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let config = parse_config(&[]).unwrap();
        assert_eq!(config.backends, wgpu::Backends::all());
        assert!(!config.show_fps);
        assert_eq!((config.width, config.height), (1280, 720));
        assert!(config.obj_path.is_none());
        assert_eq!(config.headless_frames, None);
    }

    #[test]
    fn size_and_backend() {
        let a = args(&["--size=800X600", "--gpu-backend=VK", "--show-fps=on"]);
        let config = parse_config(&a).unwrap();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.backends, wgpu::Backends::VULKAN);
        assert!(config.show_fps);

        assert_eq!(parse_size_args(&args(&["--width=0", "--height=300"])), (1, 300));
    }

    #[test]
    fn scene_flags() {
        let a = args(&[
            "--obj=models/teapot.obj",
            "--fov=60",
            "--eye=1, 2,3",
            "--orbit=45",
            "--headless-frames=10",
        ]);
        let config = parse_config(&a).unwrap();
        assert_eq!(config.obj_path, Some(PathBuf::from("models/teapot.obj")));
        assert_eq!(config.camera.fov_y_deg, 60.0);
        assert_eq!(config.camera.eye, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.orbit_deg_per_sec, 45.0);
        assert_eq!(config.headless_frames, Some(10));
    }

    #[test]
    fn malformed_scene_flags_are_errors() {
        assert!(parse_config(&args(&["--eye=1,2"])).is_err());
        assert!(parse_config(&args(&["--eye=1,2,3,4"])).is_err());
        assert!(parse_config(&args(&["--fov=wide"])).is_err());
        assert!(parse_config(&args(&["--headless-frames=-1"])).is_err());
    }
}
