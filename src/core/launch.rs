//! Child process launching.
//!
//! The argument vector is fixed: jar invocation, both heap flags set to the
//! configured memory size, the garbage-collector tuning battery, the jar
//! filename, and the no-GUI flag. Only the memory size and jar filename are
//! configurable.

use std::io;
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::config::ServerConfig;

/// Garbage-collector tuning flags, passed verbatim on every launch.
const GC_FLAGS: [&str; 10] = [
    "-XX:+UseG1GC",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:MaxGCPauseMillis=50",
    "-XX:+DisableExplicitGC",
    "-XX:TargetSurvivorRatio=90",
    "-XX:G1NewSizePercent=50",
    "-XX:G1MaxNewSizePercent=80",
    "-XX:InitiatingHeapOccupancyPercent=10",
    "-XX:G1MixedGCLiveThresholdPercent=50",
    "-XX:+AggressiveOpts",
];

/// Builds the fixed argument vector for the given config.
pub(crate) fn build_args(cfg: &ServerConfig) -> Vec<String> {
    let mut args = vec![
        "-jar".to_string(),
        format!("-Xms{}", cfg.options.ram),
        format!("-Xmx{}", cfg.options.ram),
    ];
    args.extend(GC_FLAGS.iter().map(|flag| flag.to_string()));
    args.push(cfg.options.jar.clone());
    args.push("nogui".to_string());
    args
}

/// Pipes taken from a freshly spawned child.
pub(crate) struct SpawnedServer {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Spawns the server process with the instance name as working directory and
/// all three standard streams piped.
pub(crate) fn spawn_server(cfg: &ServerConfig) -> io::Result<SpawnedServer> {
    let mut child = Command::new(&cfg.options.java)
        .args(build_args(cfg))
        .current_dir(&cfg.name)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("stdin was not captured"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("stderr was not captured"))?;

    Ok(SpawnedServer {
        child,
        stdin,
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_vector_order_is_fixed() {
        let mut cfg = ServerConfig::new("srv", "1.10.2");
        cfg.options.ram = "2G".to_string();
        cfg.options.jar = "paper.jar".to_string();

        let args = build_args(&cfg);
        assert_eq!(args[0], "-jar");
        assert_eq!(args[1], "-Xms2G");
        assert_eq!(args[2], "-Xmx2G");
        assert_eq!(&args[3..13], &GC_FLAGS.map(String::from)[..]);
        assert_eq!(args[13], "paper.jar");
        assert_eq!(args[14], "nogui");
        assert_eq!(args.len(), 15);
    }

    #[test]
    fn heap_flags_share_the_memory_size() {
        let cfg = ServerConfig::new("srv", "latest");
        let args = build_args(&cfg);
        assert_eq!(args[1], "-Xms1G");
        assert_eq!(args[2], "-Xmx1G");
    }
}
