use std::fmt::Write;

use axum::Router;

use crate::git::types::{FileChange, FileStatus};

/// A simple unified diff patch for use in tests: +3 / -1.
pub const SAMPLE_PATCH: &str = r#"@@ -1,5 +1,7 @@
 fn main() {
-    println!("hello");
+    println!("hello world");
+    let x = 42;
+    dbg!(x);
 }
"#;

/// Well-formed generation reply.
pub const WELL_FORMED_REPLY: &str = "TITLE: Add session-based login flow
DESCRIPTION:
Added a login flow so users can authenticate before reaching the dashboard.

Changes:
- Created the login form component
- Added the session endpoint
- Wired the auth guard into the router";

/// Build a patch with exactly `added` `+` lines and `deleted` `-` lines,
/// framed by `---`/`+++` headers and a hunk header.
pub fn patch_with_counts(added: usize, deleted: usize) -> String {
    let mut patch = format!("--- a/file\n+++ b/file\n@@ -1,{deleted} +1,{added} @@\n context\n");
    for i in 0..deleted {
        let _ = writeln!(patch, "-old line {i}");
    }
    for i in 0..added {
        let _ = writeln!(patch, "+new line {i}");
    }
    patch.push_str(" trailing context");
    patch
}

/// Three changed files totalling +50 / -10.
pub fn sample_files() -> Vec<FileChange> {
    vec![
        FileChange::new("src/auth/login.rs", FileStatus::Added, Some(patch_with_counts(30, 0))),
        FileChange::new("src/routes.rs", FileStatus::Modified, Some(patch_with_counts(15, 6))),
        FileChange::new("src/legacy.rs", FileStatus::Modified, Some(patch_with_counts(5, 4))),
    ]
}

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
