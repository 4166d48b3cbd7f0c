use crate::{cli::Args, errors::Result, fail};

pub const LIVENESS_PATH: &str = "/liveness";

pub fn run(args: Args, fallback_bind: String) {
    let bind = args.check_bind.unwrap_or(fallback_bind);
    println!("Checking liveness of {bind}...");

    if let Err(e) = check(&bind) {
        eprintln!("Health check failed: {e}");
        std::process::exit(1);
    }
    println!("Health check passed");
}

/// 请求 `bind` 上的存活探针，只有 200 视为健康。
pub fn check(bind: &str) -> Result<()> {
    let endpoint = format!("http://{bind}{LIVENESS_PATH}");
    let resp = minreq::get(&endpoint)
        .with_timeout(1)
        .send()
        .map_err(|e| fail!("{}: {}", endpoint, e))?;

    match resp.status_code {
        200 => Ok(()),
        status_code => Err(fail!("{} responded with status {}", endpoint, status_code)),
    }
}
