use hexvote_core::Predictor;

pub fn run(
    host: &str,
    port: u16,
    admin: i64,
    allow: Option<&str>,
    config_path: Option<&str>,
) {
    let gateway = super::make_gateway(admin, allow, config_path);

    let base = format!("http://{host}:{port}");
    let n_users = gateway.access().list(admin).map(|u| u.len()).unwrap_or(0);

    println!("🔮 Hexvote Server v{}", hexvote_core::VERSION);
    println!("   {base}");
    println!("   {} predictors, {n_users} allowed users (admin {admin})", Predictor::COUNT);
    println!();
    println!("   Endpoints:");
    println!("     GET    /                        API index (try: curl {base})");
    println!("     POST   /api/v1/message          Route a chat message");
    println!("     POST   /api/v1/submit           Classify a token");
    println!("     POST   /api/v1/feedback         Report the actual result");
    println!("     GET    /api/v1/stats?admin_id=  Predictor accuracy");
    println!("     GET    /admin/users?admin_id=   List allowed users");
    println!("     POST   /admin/users             Allow a user");
    println!("     DELETE /admin/users/{{id}}        Revoke a user");
    println!("     GET    /health                  Health check");
    println!();
    println!("   Examples:");
    println!(
        "     curl -X POST {base}/api/v1/message -H 'content-type: application/json' \\\n       -d '{{\"user_id\": {admin}, \"text\": \"d41d8cd98f00b204e9800998ecf8427e\"}}'"
    );
    println!("     curl {base}/api/v1/stats?admin_id={admin}");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: cannot start async runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(hexvote_server::run_server(gateway, host, port)) {
        eprintln!("Error: server failed on {host}:{port}: {e}");
        std::process::exit(1);
    }
}
