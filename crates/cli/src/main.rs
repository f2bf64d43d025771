use anyhow::{Context as _, Result};
use argtree::{App, Command, Context, Destination, Flag};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    init_tracing();
    load_dotenv();

    let app = build_app();
    app.run(std::env::args())?;
    Ok(())
}

fn build_app() -> App {
    let verbose = Destination::new(false);
    let before_verbose = verbose.clone();

    App::new("greet")
        .usage("a friendly greeter")
        .version("1.0.0")
        .enable_bash_completion()
        .flag(Flag::bool("formal").usage("use a formal greeting"))
        .flag(
            Flag::string("name, n", "World")
                .usage("who to greet")
                .env("GREET_NAME")
                .file("greet-name.txt"),
        )
        .flag(Flag::string_slice("tag, t", Vec::<String>::new()).usage("attach a `TAG` (repeatable)"))
        .flag(Flag::bool("verbose").usage("log each dispatch step").destination(&verbose))
        .before(move |ctx| {
            if before_verbose.get() {
                tracing::info!(name = %ctx.string("name"), tags = ?ctx.string_slice("tag"), "resolved root flags");
            }
            Ok(())
        })
        .command(
            Command::new("hello")
                .short_name("h")
                .usage("say hello")
                .description("Greets NAME once per --times, optionally shouting.")
                .flag(Flag::bool("shout").usage("print in upper case"))
                .flag(
                    Flag::int("times", 1)
                        .usage("repeat the greeting `N` times")
                        .env("GREET_TIMES"),
                )
                .action(hello),
        )
        .command(
            Command::new("goodbye")
                .short_name("g")
                .usage("say goodbye")
                .action(goodbye),
        )
        .command(
            Command::new("list")
                .usage("list things")
                .subcommand(
                    Command::new("items")
                        .usage("number the given items, or the root tags when none are given")
                        .flag(Flag::uint("limit", 0).usage("print at most `N` items (0 = all)"))
                        .action(items),
                ),
        )
        .command(
            Command::new("flags")
                .usage("print the root flag descriptions as JSON")
                .action(flags),
        )
        .command(
            Command::new("echo")
                .usage("print the arguments verbatim")
                .skip_flag_parsing()
                .action(echo),
        )
}

fn decorate(ctx: &Context<'_>, greeting: &str) -> String {
    let mut line = format!("{greeting}, {}!", ctx.global_string("name"));
    let tags = ctx.global_string_slice("tag");
    if !tags.is_empty() {
        line.push_str(&format!(" [{}]", tags.join(", ")));
    }
    line
}

fn hello(ctx: &Context<'_>) -> Result<()> {
    tracing::debug!("executing hello command");
    let greeting = if ctx.global_bool("formal") { "Good day" } else { "Hello" };
    let mut line = decorate(ctx, greeting);
    if ctx.bool("shout") {
        line = line.to_uppercase();
    }
    let times = ctx.int("times");
    if times < 0 {
        anyhow::bail!("--times must not be negative (got {times})");
    }
    for _ in 0..times {
        println!("{line}");
    }
    Ok(())
}

fn goodbye(ctx: &Context<'_>) -> Result<()> {
    tracing::debug!("executing goodbye command");
    let farewell = if ctx.global_bool("formal") { "Farewell" } else { "Goodbye" };
    println!("{}", decorate(ctx, farewell));
    Ok(())
}

fn items(ctx: &Context<'_>) -> Result<()> {
    let mut entries: Vec<String> = ctx.args().iter().map(str::to_string).collect();
    if entries.is_empty() {
        entries = ctx.global_string_slice("tag");
    }
    let limit = match ctx.uint("limit") {
        0 => entries.len(),
        n => n,
    };
    for (i, entry) in entries.iter().take(limit).enumerate() {
        println!("{}. {entry}", i + 1);
    }
    Ok(())
}

fn flags(ctx: &Context<'_>) -> Result<()> {
    let descriptions: Vec<_> = ctx
        .app()
        .flag_list()
        .iter()
        .filter(|f| !f.is_hidden())
        .map(Flag::describe)
        .collect();
    let json =
        serde_json::to_string_pretty(&descriptions).context("failed to serialize flag descriptions")?;
    println!("{json}");
    Ok(())
}

fn echo(ctx: &Context<'_>) -> Result<()> {
    let words: Vec<&str> = ctx.args().iter().collect();
    println!("{}", words.join(" "));
    Ok(())
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "failed to load .env"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
