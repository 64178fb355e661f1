//! Immpression admin CLI - moderation console for the marketplace API

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use console::{style, Term};
use immpression_admin::config::{
    AdminConfig, ArtworkCommand, CliArgs, Commands, ListArgs, OutputFormat, PayoutCommand,
    RecordCommand, ReportCommand, SortSpec,
};
use immpression_admin::error::AdminError;
use immpression_admin::gateway::{
    AdminUser, Artwork, AuthApi, GatewayClient, Order, PayoutPreview, Report, ReportDetail,
};
use immpression_admin::list::{
    FetchOutcome, ListController, ListOptions, ListSnapshot, ListSource, PageSlot, Sortable,
    StatsOrigin, DEFAULT_PAGE_SIZE, NARROW_WINDOW, WIDE_WINDOW,
};
use immpression_admin::progress::ActivityIndicator;
use immpression_admin::resources::{
    describe_amount, format_usd, resolve_amount, ArtworkSource, OrderSource, ReportFilter,
    ReportSource, Resource, UserSource,
};
use immpression_admin::session::{
    ActivityKind, FileSessionStorage, GuardEvent, SessionGuard, SessionStore,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_tracing(args.verbose, args.log_json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    // Handle result
    if let Err(e) = runtime.block_on(run(args)) {
        let message = match e.downcast_ref::<AdminError>() {
            Some(err) => err.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Everything one invocation needs
struct App {
    config: AdminConfig,
    session: SessionStore,
    indicator: ActivityIndicator,
}

impl App {
    fn client(&self) -> anyhow::Result<Arc<GatewayClient>> {
        let url = self.config.require_api_url()?;
        Ok(Arc::new(GatewayClient::new(
            url,
            self.config.timeout,
            self.session.clone(),
        )?))
    }

    /// Run `fut` behind the spinner
    async fn busy<T>(
        &self,
        msg: &str,
        fut: impl Future<Output = immpression_admin::Result<T>>,
    ) -> immpression_admin::Result<T> {
        self.indicator.begin(msg);
        let result = fut.await;
        self.indicator.clear();
        result
    }

    /// Print `value` as JSON, or run `text` in text mode
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        match self.config.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(value),
        }
        Ok(())
    }

    /// Report a completed mutation
    fn done(&self, message: &str) {
        match self.config.output {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "message": message }));
            }
            OutputFormat::Text if self.indicator.is_enabled() => {
                self.indicator.finish_success(message);
            }
            OutputFormat::Text => println!("{}", message),
        }
    }

    /// Ask before doing something irreversible
    fn confirm(&self, prompt: &str) -> anyhow::Result<bool> {
        if self.config.assume_yes {
            return Ok(true);
        }
        let term = Term::stderr();
        if !term.is_term() {
            bail!("{} (pass --yes to confirm non-interactively)", prompt);
        }
        term.write_str(&format!("{} [y/N] ", prompt))?;
        let answer = term.read_line()?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = AdminConfig::from_cli(&args)?;

    let path = config.session_path()?;
    let session = SessionStore::new(Arc::new(FileSessionStorage::new(&path)));
    let restored = session
        .hydrate()
        .with_context(|| format!("failed to read session from {}", path.display()))?;
    debug!(restored, path = %path.display(), "session loaded");

    let indicator = if config.quiet {
        ActivityIndicator::disabled()
    } else {
        ActivityIndicator::new()
    };
    let app = App {
        config,
        session,
        indicator,
    };

    let result = handle_command(args.command, &app).await;
    let (requests, failed) = app.indicator.counts();
    debug!(requests, failed, elapsed = ?app.indicator.elapsed(), "finished");
    result
}

async fn handle_command(command: Commands, app: &App) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => cmd_login(app, &email, password).await,
        Commands::Logout => cmd_logout(app),
        Commands::Whoami => cmd_whoami(app),
        Commands::Renew => cmd_renew(app).await,
        Commands::Artworks { list, filter, sort } => {
            let source = ArtworkSource::new(app.client()?);
            show_list(app, source, &list, filter, sort, DEFAULT_PAGE_SIZE, artwork_row).await
        }
        Commands::Users { list, filter, sort } => {
            let source = UserSource::new(app.client()?);
            show_list(app, source, &list, filter, sort, DEFAULT_PAGE_SIZE, user_row).await
        }
        Commands::Orders { list, filter, sort } => {
            let source = OrderSource::new(app.client()?);
            show_list(app, source, &list, filter, sort, DEFAULT_PAGE_SIZE, order_row).await
        }
        Commands::Reports {
            list,
            status,
            target,
            sort,
        } => {
            let source = ReportSource::new(app.client()?);
            let filter = ReportFilter {
                status: status.map(Into::into),
                target: target.map(Into::into),
            };
            let page_size = Resource::Reports.default_page_size();
            show_list(app, source, &list, filter, sort, page_size, report_row).await
        }
        Commands::Stats { resource } => cmd_stats(app, resource).await,
        Commands::Artwork { action } => cmd_artwork(app, action).await,
        Commands::User { action } => cmd_user(app, action).await,
        Commands::Order { action } => cmd_order(app, action).await,
        Commands::Payout { action } => cmd_payout(app, action).await,
        Commands::Report { action } => cmd_report(app, action).await,
        Commands::Watch => cmd_watch(app).await,
    }
}

// --- session ------------------------------------------------------------

async fn cmd_login(app: &App, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let term = Term::stderr();
            if !term.is_term() {
                bail!("no password given; pass --password or set IMMPRESSION_ADMIN_PASSWORD");
            }
            term.write_str("Password: ")?;
            term.read_secure_line()?
        }
    };

    let client = app.client()?;
    let session = app
        .busy("Signing in", app.session.sign_in(client.as_ref(), email, &password))
        .await?;
    app.done(&format!("Signed in as {}", session.identity()));
    Ok(())
}

fn cmd_logout(app: &App) -> anyhow::Result<()> {
    let was = app.session.identity();
    app.session.logout();
    match was {
        Some(identity) => app.done(&format!("Signed out {}", identity)),
        None => app.done("No active session"),
    }
    Ok(())
}

fn cmd_whoami(app: &App) -> anyhow::Result<()> {
    let identity = app.session.identity();
    app.emit(&serde_json::json!({ "identity": identity.clone() }), |_| match &identity {
        Some(identity) => println!("{}", identity),
        None => println!("Not signed in"),
    })
}

async fn cmd_renew(app: &App) -> anyhow::Result<()> {
    let client = app.client()?;
    app.busy("Renewing session", app.session.renew(client.as_ref()))
        .await?;
    app.done("Session renewed");
    Ok(())
}

// --- lists --------------------------------------------------------------

/// Fail unless the fetch result was applied
async fn show_list<S>(
    app: &App,
    source: S,
    list: &ListArgs,
    filter: S::Filter,
    sort: Option<SortSpec<<S::Record as Sortable>::Column>>,
    default_page_size: u32,
    row: fn(&S::Record) -> String,
) -> anyhow::Result<()>
where
    S: ListSource,
    S::Record: Serialize,
    S::Stats: Serialize,
{
    let options = ListOptions {
        page_size: list.page_size.unwrap_or(default_page_size),
        debounce: app.config.search_debounce,
        filter,
        search: list.search.clone().unwrap_or_default(),
    };
    if options.page_size == 0 {
        bail!("page size must be at least 1");
    }
    let ctrl = ListController::new(Arc::new(source), options);

    app.indicator.begin("Loading");
    let loaded = async {
        ctrl.fetch_page().await.into_result()?;
        if list.page > 1 {
            match ctrl.set_page(list.page).await {
                FetchOutcome::Ignored => bail!(
                    "page {} is out of range (1-{})",
                    list.page,
                    ctrl.total_pages()
                ),
                outcome => {
                    outcome.into_result()?;
                }
            }
        }
        if ctrl.source().stats_origin() == StatsOrigin::Endpoint {
            if let Err(e) = ctrl.refresh_stats().await {
                tracing::warn!(error = %e, "stats unavailable");
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;
    app.indicator.clear();
    loaded?;

    if let Some(spec) = sort {
        for _ in 0..spec.clicks() {
            ctrl.toggle_sort(spec.column);
        }
    }

    let window = if list.narrow { NARROW_WINDOW } else { WIDE_WINDOW };
    let snapshot = ctrl.snapshot(window);
    app.emit(&snapshot, |snap| render_list(snap, row))
}

fn render_list<R, St: Serialize>(snap: &ListSnapshot<R, St>, row: fn(&R) -> String) {
    println!(
        "{}",
        style(format!(
            "{}  page {} of {}  ({} per page)",
            snap.filter, snap.page, snap.total_pages, snap.page_size
        ))
        .bold()
    );
    if !snap.search.is_empty() {
        println!("search: {}", snap.search);
    }
    let origin = match snap.stats_origin {
        StatsOrigin::Endpoint => "",
        StatsOrigin::LoadedPage => " (this page)",
    };
    println!("{}{}", style(tiles(&snap.stats)).dim(), style(origin).dim());
    println!();

    if snap.items.is_empty() {
        println!("No records found.");
    }
    for item in &snap.items {
        println!("{}", row(item));
    }
    println!();
    println!("{}", pager(snap));
}

/// `key: value` pairs of a stats struct
fn tiles<St: Serialize>(stats: &St) -> String {
    match serde_json::to_value(stats) {
        Ok(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("  "),
        _ => String::new(),
    }
}

fn pager<R, St>(snap: &ListSnapshot<R, St>) -> String {
    let arrow = |enabled: bool, s: &'static str| {
        if enabled {
            style(s).to_string()
        } else {
            style(s).dim().to_string()
        }
    };
    let mut parts = vec![arrow(snap.nav.first, "«"), arrow(snap.nav.previous, "‹")];
    for slot in &snap.window {
        parts.push(match slot {
            PageSlot::Page(p) if *p == snap.page => style(format!("[{}]", p)).bold().to_string(),
            PageSlot::Page(p) => p.to_string(),
            PageSlot::Ellipsis => "…".to_string(),
        });
    }
    parts.push(arrow(snap.nav.next, "›"));
    parts.push(arrow(snap.nav.last, "»"));
    parts.join(" ")
}

fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn date(d: Option<DateTime<Utc>>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn artwork_row(a: &Artwork) -> String {
    format!(
        "{:<24} {:<30} {:<22} {:<9} {}",
        a.id,
        fit(&a.name, 30),
        fit(&a.artist_name, 22),
        a.stage,
        date(a.created_at)
    )
}

fn user_row(u: &AdminUser) -> String {
    format!(
        "{:<24} {:<24} {:<30} {:<9} {}",
        u.id,
        fit(&u.name, 24),
        fit(&u.email, 30),
        if u.stripe_linked { "stripe" } else { "-" },
        date(u.created_at)
    )
}

fn order_row(o: &Order) -> String {
    format!(
        "{:<24} {:<24} {:<20} {:<11} {:>10} {:>10}",
        o.id,
        fit(o.art_name.as_deref().unwrap_or("-"), 24),
        fit(o.customer.as_deref().unwrap_or("-"), 20),
        o.status,
        o.total_amount
            .or(o.price)
            .map(|p| format!("${:.2}", p))
            .unwrap_or_else(|| "-".to_string()),
        o.seller_remaining_cents
            .map(format_usd)
            .unwrap_or_else(|| "-".to_string()),
    )
}

fn report_row(r: &Report) -> String {
    let sla = r.sla(Utc::now());
    let sla_text = if sla.is_overdue() {
        style(sla.to_string()).red().bold().to_string()
    } else {
        sla.to_string()
    };
    format!(
        "{:<24} {:<20} {:<5} {:<24} {:<12} {:<10}{}",
        r.id,
        fit(&r.reason_label(), 20),
        r.target_kind.as_str(),
        fit(r.target_label(), 24),
        r.status,
        sla_text,
        if r.is_urgent() { " !" } else { "" }
    )
}

async fn cmd_stats(app: &App, resource: Resource) -> anyhow::Result<()> {
    let client = app.client()?;
    match resource {
        Resource::Artworks => tiles_for(app, ArtworkSource::new(client)).await,
        Resource::Users => tiles_for(app, UserSource::new(client)).await,
        Resource::Orders => tiles_for(app, OrderSource::new(client)).await,
        Resource::Reports => tiles_for(app, ReportSource::new(client)).await,
    }
}

async fn tiles_for<S>(app: &App, source: S) -> anyhow::Result<()>
where
    S: ListSource,
    S::Stats: Serialize,
{
    let ctrl = ListController::with_defaults(Arc::new(source));
    let origin = ctrl.source().stats_origin();
    let stats = match origin {
        StatsOrigin::Endpoint => app.busy("Loading stats", ctrl.refresh_stats()).await?,
        StatsOrigin::LoadedPage => {
            app.indicator.begin("Loading first page");
            let outcome = ctrl.fetch_page().await;
            app.indicator.clear();
            outcome.into_result()?;
            ctrl.stats()
        }
    };
    app.emit(&stats, |stats| {
        println!("{}", tiles(stats));
        if origin == StatsOrigin::LoadedPage {
            println!("{}", style("counts cover the first loaded page").dim());
        }
    })
}

// --- records ------------------------------------------------------------

async fn cmd_artwork(app: &App, action: ArtworkCommand) -> anyhow::Result<()> {
    let ctrl = ListController::with_defaults(Arc::new(ArtworkSource::new(app.client()?)));
    match action {
        ArtworkCommand::Show { id } => {
            let art = app
                .busy("Loading artwork", ctrl.source().client().get_artwork(&id))
                .await?;
            app.emit(&art, print_artwork)
        }
        ArtworkCommand::Approve { id } => {
            let receipt = app.busy("Approving", ctrl.approve(&id)).await?;
            app.done(&receipt.message);
            Ok(())
        }
        ArtworkCommand::Reject { id } => {
            let receipt = app.busy("Rejecting", ctrl.reject(&id)).await?;
            app.done(&receipt.message);
            Ok(())
        }
        ArtworkCommand::Delete { id } => {
            if !app.confirm(&format!("Delete artwork {}?", id))? {
                return Ok(());
            }
            let receipt = app.busy("Deleting", ctrl.delete(&id)).await?;
            app.done(&receipt.message);
            Ok(())
        }
    }
}

fn print_artwork(a: &Artwork) {
    println!("{}", style(&a.name).bold());
    println!("Artist:    {}", a.artist_name);
    println!("Stage:     {}", a.stage);
    if let Some(category) = &a.category {
        println!("Category:  {}", category);
    }
    if let Some(price) = a.price {
        println!("Price:     ${:.2}", price);
    }
    println!("Views:     {}", a.views);
    println!("Uploaded:  {}", date(a.created_at));
    if let Some(reviewer) = &a.reviewed_by_email {
        println!("Reviewed:  {} on {}", reviewer, date(a.reviewed_at));
    }
    if let Some(link) = &a.image_link {
        println!("Image:     {}", link);
    }
    if let Some(description) = &a.description {
        println!();
        println!("{}", description);
    }
}

async fn cmd_user(app: &App, action: RecordCommand) -> anyhow::Result<()> {
    let ctrl = ListController::with_defaults(Arc::new(UserSource::new(app.client()?)));
    match action {
        RecordCommand::Show { id } => {
            let user = app
                .busy("Loading user", ctrl.source().client().get_user(&id))
                .await?;
            app.emit(&user, print_user)
        }
        RecordCommand::Delete { id } => {
            if !app.confirm(&format!("Delete user {}?", id))? {
                return Ok(());
            }
            let receipt = app.busy("Deleting", ctrl.delete(&id)).await?;
            app.done(&receipt.message);
            Ok(())
        }
    }
}

fn print_user(u: &AdminUser) {
    println!("{} <{}>", style(&u.name).bold(), u.email);
    if let Some(account_type) = &u.account_type {
        println!("Account:   {}", account_type);
    }
    if let Some(artist_type) = &u.artist_type {
        println!("Artist:    {}", artist_type);
    }
    println!(
        "Stripe:    {}",
        match (&u.stripe_account_id, u.stripe_onboarding_completed) {
            (Some(id), true) => format!("{} (onboarded)", id),
            (Some(id), false) => format!("{} (onboarding incomplete)", id),
            (None, _) => "not linked".to_string(),
        }
    );
    println!("Views:     {}", u.views);
    println!("Joined:    {}", date(u.created_at));
    println!("Avatar:    {}", u.profile_picture_link);
    if let Some(bio) = &u.bio {
        println!();
        println!("{}", bio);
    }
}

async fn cmd_order(app: &App, action: RecordCommand) -> anyhow::Result<()> {
    let ctrl = ListController::with_defaults(Arc::new(OrderSource::new(app.client()?)));
    match action {
        RecordCommand::Show { id } => {
            let order = app
                .busy("Loading order", ctrl.source().client().get_order(&id))
                .await?;
            app.emit(&order, print_order)
        }
        RecordCommand::Delete { id } => {
            if !app.confirm(&format!("Delete order {}?", id))? {
                return Ok(());
            }
            let receipt = app.busy("Deleting", ctrl.delete(&id)).await?;
            app.done(&receipt.message);
            Ok(())
        }
    }
}

fn print_order(o: &Order) {
    println!("{}", style(format!("Order {}", o.id)).bold());
    println!("Artwork:     {}", o.art_name.as_deref().unwrap_or("-"));
    println!("Artist:      {}", o.artist_name.as_deref().unwrap_or("-"));
    println!(
        "Customer:    {} {}",
        o.customer.as_deref().unwrap_or("-"),
        o.customer_email
            .as_deref()
            .map(|e| format!("<{}>", e))
            .unwrap_or_default()
    );
    println!("Status:      {}", o.status);
    if let Some(total) = o.total_amount.or(o.price) {
        println!("Total:       ${:.2}", total);
    }
    println!("Transferred: {}", format_usd(o.seller_transferred_cents));
    if let Some(remaining) = o.seller_remaining_cents {
        println!("Remaining:   {}", format_usd(remaining));
    }
    println!("Placed:      {}", date(o.created_at));
}

async fn cmd_payout(app: &App, action: PayoutCommand) -> anyhow::Result<()> {
    let ctrl = ListController::with_defaults(Arc::new(OrderSource::new(app.client()?)));
    match action {
        PayoutCommand::Preview { order } => {
            let preview = app
                .busy("Loading payout preview", ctrl.payout_preview(&order))
                .await?;
            app.emit(&preview, print_preview)
        }
        PayoutCommand::Send { order, usd } => {
            // advisory only; a failed preview still allows an explicit amount
            let remaining = match app.busy("Loading payout preview", ctrl.payout_preview(&order)).await {
                Ok(preview) => preview.remaining_cents,
                Err(e) if usd.is_some() => {
                    tracing::warn!(error = %e, "payout preview unavailable");
                    0
                }
                Err(e) => return Err(e.into()),
            };
            let amount = resolve_amount(usd.as_deref(), remaining)?;

            let prompt = format!("Send a payout of {} to the seller?", describe_amount(amount));
            if !app.confirm(&prompt)? {
                return Ok(());
            }
            let receipt = app.busy("Sending payout", ctrl.send_payout(&order, amount)).await?;
            match app.config.output {
                OutputFormat::Json => app.emit(&receipt, |_| {})?,
                OutputFormat::Text => {
                    app.done(&format!("Payout sent: {}", format_usd(receipt.amount_cents)))
                }
            }
            Ok(())
        }
    }
}

fn print_preview(p: &PayoutPreview) {
    println!("Remaining to seller: {}", format_usd(p.remaining_cents));
    println!("Suggested payout:    {}", format_usd(p.remaining_cents));
    if let Some(due) = p.due_cents {
        println!("Due to seller:       {}", format_usd(due));
    }
    if let Some(sent) = p.transferred_cents {
        println!("Already transferred: {}", format_usd(sent));
    }
    let mut extras = Vec::new();
    if let Some(fee) = p.stripe_fee_cents {
        extras.push(format!("Stripe fee: {}", format_usd(fee)));
    }
    if let Some(tax) = p.tax_cents {
        extras.push(format!("Tax held: {}", format_usd(tax)));
    }
    if let Some(hold) = p.platform_hold_cents {
        extras.push(format!("Platform hold: {}", format_usd(hold)));
    }
    if !extras.is_empty() {
        println!("{}", style(extras.join(" • ")).dim());
    }
}

async fn cmd_report(app: &App, action: ReportCommand) -> anyhow::Result<()> {
    let ctrl = ListController::with_defaults(Arc::new(ReportSource::new(app.client()?)));
    if let ReportCommand::Show { id } = &action {
        let detail = app.busy("Loading report", ctrl.detail(id)).await?;
        return app.emit(&detail, print_report);
    }
    let Some((id, moderation)) = action.action() else {
        bail!("no moderation action given");
    };

    moderation.validate()?;
    if matches!(moderation.name(), "ban" | "suspend" | "remove_content")
        && !app.confirm(&format!("{} for report {}?", moderation.name(), id))?
    {
        return Ok(());
    }
    let receipt = app.busy("Applying action", ctrl.moderate(id, &moderation)).await?;
    app.done(&receipt.message);
    Ok(())
}

fn print_report(detail: &ReportDetail) {
    let r = &detail.report;
    let sla = r.sla(Utc::now());
    println!("{}", style(format!("Report {}", r.id)).bold());
    println!("Reason:    {}", r.reason_label());
    println!("Status:    {}", r.status);
    println!("Target:    {} {}", r.target_kind.as_str(), r.target_label());
    println!("Reporter:  {}", r.reporter.label());
    println!("Filed:     {}", date(r.created_at));
    let sla_line = format!("SLA:       {}{}", sla, if r.is_urgent() { " (at risk)" } else { "" });
    if sla.is_overdue() {
        println!("{}", style(sla_line).red());
    } else {
        println!("{}", sla_line);
    }
    if let Some(description) = &r.description {
        println!();
        println!("{}", description);
    }
    if let Some(action) = &r.resolution_action {
        println!();
        println!(
            "Resolved:  {} by {} on {}",
            action,
            r.resolved_by.label(),
            date(r.resolved_at)
        );
        if let Some(notes) = &r.resolution_notes {
            println!("Notes:     {}", notes);
        }
    }
    if !detail.related_reports.is_empty() {
        println!();
        println!("Related reports:");
        for related in &detail.related_reports {
            println!("  {}", report_row(related));
        }
    }
}

// --- idle watch ---------------------------------------------------------

async fn cmd_watch(app: &App) -> anyhow::Result<()> {
    let client = app.client()?;
    let api: Arc<dyn AuthApi> = client;
    let mut guard = SessionGuard::start(app.session.clone(), api, app.config.idle)?;

    println!(
        "Watching session for {}; idle logout after {}.",
        app.session.identity().unwrap_or_default(),
        humantime::format_duration(app.config.idle.timeout())
    );
    println!("Type anything to count as activity, `stay` to renew, `logout` to sign out.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut log_out = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "stay" => match app.busy("Renewing session", guard.stay_logged_in()).await {
                        Ok(()) => println!("Session renewed."),
                        Err(e) if e.is_auth_error() => {
                            println!("{}", e.user_message());
                            break;
                        }
                        Err(e) => eprintln!("{} {}", style("✗").red(), e.user_message()),
                    },
                    "logout" => {
                        log_out = true;
                        break;
                    }
                    _ => guard.activity(ActivityKind::KeyPress),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            event = guard.next_event() => match event {
                Some(GuardEvent::WarningPrompt { message }) => {
                    println!("{}", style(message).yellow().bold());
                }
                Some(GuardEvent::Resumed) => println!("Welcome back."),
                Some(GuardEvent::LoggedOut { notice }) => {
                    println!("{}", style(notice).red());
                    break;
                }
                None => break,
            },
        }
    }

    if log_out {
        guard.log_out_now();
        app.done("Signed out");
    }
    Ok(())
}
