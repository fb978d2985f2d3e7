//! Example: Convert a few live pages and show what the text looks like
//!
//! Run with: cargo run -p web2txt --example convert_urls
//!
//! Set RUST_LOG=web2txt=debug to watch the pipeline stages.

use tracing_subscriber::EnvFilter;
use web2txt::{FetchError, Pipeline, Web2TxtError};

struct Case {
    url: &'static str,
    description: &'static str,
    expect_contains: Option<&'static str>,
}

const CASES: &[Case] = &[
    Case {
        url: "example.com",
        description: "Bare host, scheme defaults to https",
        expect_contains: Some("Example Domain"),
    },
    Case {
        url: "https://httpbin.org/html",
        description: "Longer HTML document",
        expect_contains: Some("Herman Melville"),
    },
    Case {
        url: "https://httpbin.org/status/404",
        description: "Missing page",
        expect_contains: None,
    },
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    println!("web2txt conversion examples");
    println!("===========================\n");

    let pipeline = Pipeline::default();
    let mut failed = 0;

    for (i, case) in CASES.iter().enumerate() {
        println!("{}. {}", i + 1, case.description);
        println!("   URL: {}", case.url);

        let ok = match (pipeline.convert(case.url).await, case.expect_contains) {
            (Ok(text), Some(expected)) => {
                print_preview(&text);
                text.contains(expected)
            }
            (Err(Web2TxtError::Fetch(FetchError::NotFound { .. })), None) => {
                println!("   Not found, as expected");
                true
            }
            (Ok(text), None) => {
                print_preview(&text);
                false
            }
            (Err(e), _) => {
                println!("   {}", e.user_message());
                false
            }
        };

        if ok {
            println!("   ✓ PASS\n");
        } else {
            println!("   ✗ FAIL\n");
            failed += 1;
        }
    }

    println!("===========================");
    println!("{} of {} cases failed", failed, CASES.len());

    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_preview(text: &str) {
    let preview: String = text.chars().take(100).collect();
    println!(
        "   Preview: {}{}",
        preview.replace('\n', " | "),
        if text.chars().count() > 100 { "..." } else { "" }
    );
    println!("   Lines: {}", text.lines().count());
}
