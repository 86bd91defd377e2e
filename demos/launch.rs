use cmdexec::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cmdexec=debug")))
        .init();

    let git = look_path("git")?;
    info!(path = %git.display(), "found git");

    // run git status in /tmp, passing our stdout to the child
    if let Err(e) = cmd!("git", "status").run([dir("/tmp"), stdout(Sink::Inherit)]) {
        error!(error = %e, "git status in /tmp");
    }

    cmd!("sleep", "1").run([
        before_func(|c| {
            info!(cmd = %c, "about to call");
            Ok(())
        }),
        after_func(|c| {
            info!(cmd = %c, "finished calling");
            Ok(())
        }),
    ])?;

    let (out, result) = cmd!("ls", "-1").output([dir("/")]);
    info!(bytes = out.len(), ok = result.is_ok(), "captured ls");
    print!("{}", String::from_utf8_lossy(&out));

    let mut env = cmd!("sh", "-c", "echo GOPATH=$GOPATH");
    env.start([setenv("GOPATH", "/foo"), stderr(Sink::Inherit)])?;
    info!(pid = ?env.id(), "started");
    env.wait()?;

    system("echo hello world", [])?;
    Ok(())
}
