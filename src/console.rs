//! Line-driven dashboard: menus, hotkeys and the cycle-count prompt.

use std::{io::Write, sync::Arc};

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    activity::ActivityLog,
    balances::BalanceBoard,
    calls::{short_hex, BridgeMode},
    chain::BridgePair,
    client::ChainClient,
    error::UserInputError,
    sequencer::{BridgeController, RunStatus},
};

pub const HOTKEYS: &str = "(Q)uit | (M)enu | (C)lear Logs | (S)top Operation | (B)alances";
pub const CYCLE_PROMPT: &str = "Enter number of bridge transactions (empty to cancel):";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Main,
    T1,
    L2,
}

impl Menu {
    pub fn title(self) -> &'static str {
        match self {
            Menu::Main => "Actions",
            Menu::T1 => "T1 Bridge Operations",
            Menu::L2 => "L2 Bridge Operations",
        }
    }

    pub fn items(self) -> &'static [&'static str] {
        match self {
            Menu::Main => &[
                "T1 Bridge Operations",
                "L2 Bridge Operations",
                "Clear Transaction Logs",
                "Exit Application",
            ],
            Menu::T1 => &["Auto Bridge: Sepolia - T1", "Back to Main Menu"],
            Menu::L2 => &[
                "Arbitrum Sepolia - Base Sepolia",
                "Base Sepolia - Arbitrum Sepolia",
                "Back to Main Menu",
            ],
        }
    }

    fn select(self, index: usize) -> Option<Command> {
        let command = match (self, index) {
            (Menu::Main, 1) => Command::Show(Menu::T1),
            (Menu::Main, 2) => Command::Show(Menu::L2),
            (Menu::Main, 3) => Command::ClearLogs,
            (Menu::Main, 4) => Command::Quit,
            (Menu::T1, 1) => Command::AskCycles(BridgeMode::T1, BridgePair::SEPOLIA_TO_T1),
            (Menu::L2, 1) => Command::AskCycles(BridgeMode::L2, BridgePair::ARBITRUM_TO_BASE),
            (Menu::L2, 2) => Command::AskCycles(BridgeMode::L2, BridgePair::BASE_TO_ARBITRUM),
            (Menu::T1, 2) | (Menu::L2, 3) => Command::Show(Menu::Main),
            _ => return None,
        };
        Some(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show(Menu),
    AskCycles(BridgeMode, BridgePair),
    ClearLogs,
    Stop,
    Balances,
    Quit,
    Unknown(String),
}

/// Maps one input line to a command in the context of `menu`.
pub fn interpret(menu: Menu, input: &str) -> Command {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Command::Quit,
        "m" => Command::Show(Menu::Main),
        "c" => Command::ClearLogs,
        "s" => Command::Stop,
        "b" => Command::Balances,
        other => other
            .parse::<usize>()
            .ok()
            .and_then(|index| menu.select(index))
            .unwrap_or_else(|| Command::Unknown(input.to_owned())),
    }
}

pub fn parse_cycle_count(input: &str) -> Result<u32, UserInputError> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("x") {
        return Err(UserInputError::Cancelled);
    }
    match input.parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(UserInputError::NotPositiveInteger(input.to_owned())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<C, W> {
    controller: Arc<BridgeController<C>>,
    log: Arc<ActivityLog>,
    balances: Arc<BalanceBoard>,
    wallet: String,
    menu: Menu,
    prompt: Option<(BridgeMode, BridgePair)>,
    out: W,
}

impl<C: ChainClient, W: Write> Console<C, W> {
    pub fn new(
        controller: Arc<BridgeController<C>>,
        log: Arc<ActivityLog>,
        balances: Arc<BalanceBoard>,
        client: &C,
        out: W,
    ) -> Self {
        Self {
            controller,
            log,
            balances,
            wallet: short_hex(&client.address().to_string()),
            menu: Menu::Main,
            prompt: None,
            out,
        }
    }

    pub fn menu(&self) -> Menu {
        self.menu
    }

    /// Reads commands until quit or end of input. The status panel is
    /// redrawn whenever a run starts or finishes.
    pub async fn run<R>(mut self, input: R) -> eyre::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(self.out, "{}", "T1 Protocol Auto Bridge".bold())?;
        self.render_status()?;
        self.show(Menu::Main)?;
        let mut status = self.controller.subscribe();
        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) if self.handle_line(&line)? == Flow::Continue => {}
                    _ => break,
                },
                Ok(()) = status.changed() => self.render_status()?,
            }
        }
        Ok(())
    }

    pub fn handle_line(&mut self, line: &str) -> std::io::Result<Flow> {
        if let Some((mode, pair)) = self.prompt.take() {
            match parse_cycle_count(line) {
                Ok(cycles) => {
                    // A rejected start is logged by the controller.
                    let _ = self.controller.start(mode, pair, cycles);
                }
                Err(UserInputError::Cancelled) => self.log.warning("Operation cancelled."),
                Err(err @ UserInputError::NotPositiveInteger(_)) => {
                    tracing::debug!(%err, "rejected cycle count");
                    self.log
                        .error("Invalid input. Please enter a positive number.");
                }
            }
            self.show(Menu::Main)?;
            return Ok(Flow::Continue);
        }

        match interpret(self.menu, line) {
            Command::Quit => return Ok(Flow::Quit),
            Command::Show(menu) => self.show(menu)?,
            Command::ClearLogs => self.log.clear(),
            Command::Stop => {
                self.controller.cancel();
            }
            Command::Balances => self.render_status()?,
            Command::AskCycles(mode, pair) => {
                self.prompt = Some((mode, pair));
                writeln!(self.out, "{}", CYCLE_PROMPT.bold())?;
            }
            Command::Unknown(input) if input.is_empty() => self.show(self.menu)?,
            Command::Unknown(input) => {
                self.log.warning(format!("Unknown command {input:?}."));
            }
        }
        Ok(Flow::Continue)
    }

    fn show(&mut self, menu: Menu) -> std::io::Result<()> {
        self.menu = menu;
        writeln!(self.out, "{}", format!("== {} ==", menu.title()).green())?;
        for (i, item) in menu.items().iter().enumerate() {
            writeln!(self.out, "  {}. {item}", i + 1)?;
        }
        writeln!(self.out, "{HOTKEYS}")
    }

    fn render_status(&mut self) -> std::io::Result<()> {
        let status = match self.controller.snapshot() {
            Some(run) => format!(
                "{} ({} {}/{}, {}{})",
                RunStatus::Running.to_string().green(),
                run.mode,
                run.current_cycle,
                run.total_cycles,
                run.pair,
                if run.cancel_requested { ", stopping" } else { "" }
            ),
            None => RunStatus::Idle.to_string().yellow().to_string(),
        };
        writeln!(self.out, " Wallet: {}", self.wallet.cyan())?;
        writeln!(self.out, " Status: {status}")?;
        writeln!(self.out, " Network Balances:")?;
        for line in self.balances.render() {
            writeln!(self.out, "   {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncWriteExt, BufReader};

    use super::*;
    use crate::{
        activity::{tests::Captured, LogKind, DEFAULT_WIDTH},
        chain::tests::registry,
        sequencer::tests::StubClient,
    };

    #[test]
    fn hotkeys_work_from_any_menu() {
        for menu in [Menu::Main, Menu::T1, Menu::L2] {
            assert_eq!(interpret(menu, "q"), Command::Quit);
            assert_eq!(interpret(menu, " S "), Command::Stop);
            assert_eq!(interpret(menu, "C"), Command::ClearLogs);
            assert_eq!(interpret(menu, "m"), Command::Show(Menu::Main));
        }
    }

    #[test]
    fn menu_items_map_to_operations() {
        assert_eq!(interpret(Menu::Main, "1"), Command::Show(Menu::T1));
        assert_eq!(interpret(Menu::Main, "4"), Command::Quit);
        assert_eq!(
            interpret(Menu::T1, "1"),
            Command::AskCycles(BridgeMode::T1, BridgePair::SEPOLIA_TO_T1)
        );
        assert_eq!(
            interpret(Menu::L2, "2"),
            Command::AskCycles(BridgeMode::L2, BridgePair::BASE_TO_ARBITRUM)
        );
        assert_eq!(interpret(Menu::L2, "3"), Command::Show(Menu::Main));
        assert_eq!(interpret(Menu::T1, "3"), Command::Unknown("3".into()));
    }

    #[test]
    fn cycle_counts_must_be_positive_integers() {
        assert_eq!(parse_cycle_count(" 3\n"), Ok(3));
        assert_eq!(parse_cycle_count(""), Err(UserInputError::Cancelled));
        assert_eq!(parse_cycle_count("x"), Err(UserInputError::Cancelled));
        for bad in ["0", "-2", "two", "1.5"] {
            assert_eq!(
                parse_cycle_count(bad),
                Err(UserInputError::NotPositiveInteger(bad.into()))
            );
        }
    }

    fn console() -> (
        Console<StubClient, Vec<u8>>,
        Arc<BridgeController<StubClient>>,
        Arc<ActivityLog>,
    ) {
        let client = Arc::new(StubClient::default());
        let log = Arc::new(ActivityLog::silent(DEFAULT_WIDTH));
        let balances = Arc::new(BalanceBoard::default());
        let controller = Arc::new(BridgeController::new(
            Arc::new(registry()),
            client.clone(),
            log.clone(),
            balances.clone(),
        ));
        let console = Console::new(controller.clone(), log.clone(), balances, &*client, Vec::new());
        (console, controller, log)
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_starts_a_run_and_returns_to_main() {
        let (mut console, controller, _) = console();
        for line in ["2", "1"] {
            assert_eq!(console.handle_line(line).unwrap(), Flow::Continue);
        }
        console.handle_line("2").unwrap();
        assert_eq!(console.menu(), Menu::Main);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let run = controller.snapshot().unwrap();
        assert_eq!(run.mode, BridgeMode::L2);
        assert_eq!(run.total_cycles, 2);

        console.handle_line("s").unwrap();
        assert!(controller.snapshot().unwrap().cancel_requested);
    }

    #[tokio::test]
    async fn bad_prompt_input_starts_nothing() {
        let (mut console, controller, log) = console();
        console.handle_line("1").unwrap();
        console.handle_line("1").unwrap();
        console.handle_line("zero").unwrap();
        assert_eq!(controller.status(), RunStatus::Idle);
        assert_eq!(console.menu(), Menu::Main);

        console.handle_line("1").unwrap();
        console.handle_line("1").unwrap();
        console.handle_line("").unwrap();
        assert_eq!(controller.status(), RunStatus::Idle);

        let entries = log.entries();
        assert!(entries.contains(&(
            LogKind::Error,
            "Invalid input. Please enter a positive number.".to_owned()
        )));
        assert!(entries.contains(&(LogKind::Warning, "Operation cancelled.".to_owned())));
    }

    #[tokio::test]
    async fn run_stops_on_quit_or_eof() {
        let (first, _, _) = console();
        first.run(&b"1\n2\nq\n1\n"[..]).await.unwrap();

        let (second, _, _) = console();
        second.run(&b"b\n"[..]).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn status_panel_redraws_when_a_run_starts_and_ends() {
        colored::control::set_override(false);
        let client = Arc::new(StubClient::default());
        let log = Arc::new(ActivityLog::silent(DEFAULT_WIDTH));
        let balances = Arc::new(BalanceBoard::default());
        let controller = Arc::new(BridgeController::new(
            Arc::new(registry()),
            client.clone(),
            log.clone(),
            balances.clone(),
        ));
        let out = Captured::default();
        let console = Console::new(controller.clone(), log, balances, &*client, out.clone());

        let (mut keys, input) = tokio::io::duplex(64);
        let ui = tokio::spawn(console.run(BufReader::new(input)));
        keys.write_all(b"1\n1\n1\n").await.unwrap();

        // longer than one T1 settle window
        tokio::time::sleep(Duration::from_secs(3_600)).await;
        assert_eq!(controller.status(), RunStatus::Idle);
        drop(keys);
        ui.await.unwrap().unwrap();

        let printed = out.text();
        assert_eq!(printed.matches(" Status: ").count(), 3);
        assert_eq!(printed.matches(" Status: Idle").count(), 2);
        assert!(printed.contains(" Status: Running (T1 bridge"));
        assert_eq!(client.submitted().len(), 1);
    }

    #[tokio::test]
    async fn menus_are_printed_with_numbers() {
        colored::control::set_override(false);
        let (mut console, _, _) = console();
        console.handle_line("2").unwrap();
        let printed = String::from_utf8(console.out.clone()).unwrap();
        assert!(printed.contains("== L2 Bridge Operations =="));
        assert!(printed.contains("  2. Base Sepolia - Arbitrum Sepolia"));
    }
}
