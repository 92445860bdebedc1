use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn};

use predicate_filter::config::TranslatorConfig;
use predicate_filter::repository::UserRepository;
use predicate_filter::{lower, ConstantRef, Translator};

const CONFIG_FILE: &str = "translator.json";

/// 加载翻译器配置，失败时使用默认配置
fn load_config() -> TranslatorConfig {
    match TranslatorConfig::from_json_file(CONFIG_FILE) {
        Ok(config) => {
            info!(path = CONFIG_FILE, captures = config.captures.len(), "loaded translator config");
            config
        }
        Err(e) => {
            warn!(error = %e, "using default translator config");
            TranslatorConfig::default()
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config();
    let extra = config
        .captures_record("closure")
        .context("invalid captures in translator config")?;
    let repository = UserRepository::new(Translator::from_config(config));
    let env = repository.closure_env(&extra);

    println!("--- Predicate Filter: 闭包谓词到查询字符串的翻译器 ---");

    // 1. 示例闭包
    let source = r#"|p| p.Name == "Some name" && (p.Description == "dsafsdfsdfs" || p.Age == 6 || p.Id == Uuid::nil())"#;
    println!("\n[输入闭包]:\n{}\n", source);

    // 2. 降低为谓词树
    println!("[步骤 1]: 将闭包解析为谓词树...");
    let filter = lower(source, &env).context("failed to lower the sample predicate")?;
    println!("谓词树: {:#?}", filter);

    // 3. 翻译为查询字符串
    println!("\n[步骤 2]: 将谓词树翻译为查询字符串...");
    let query = repository.get_user(&filter)?;
    println!("{}", query);

    run_prompt(&repository, &env)
}

/// 交互式输入闭包并打印翻译结果
fn run_prompt(repository: &UserRepository, env: &ConstantRef) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    println!("\n输入闭包谓词 (捕获变量: user, first_user, name), 输入 :quit 退出");

    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == ":quit" {
                    break;
                }
                editor.add_history_entry(line).ok();

                match lower(line, env) {
                    Ok(filter) => match repository.get_user(&filter) {
                        Ok(query) => println!("{}", query),
                        Err(e) => println!("✗ 翻译失败: {}", e),
                    },
                    Err(e) => println!("✗ 解析失败: {}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        }
    }
    Ok(())
}
