use teloxide::types::BotCommand;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/billing <day>`; `None` when the argument is missing or invalid.
    Billing {
        day: Option<u32>,
    },
}

impl Command {
    fn all() -> Vec<BotCommand> {
        vec![
            BotCommand {
                command: "start".to_string(),
                description: "Register and start tracking expenses".to_string(),
            },
            BotCommand {
                command: "billing".to_string(),
                description: "Set the billing cycle anchor day (1-31)".to_string(),
            },
            BotCommand {
                command: "help".to_string(),
                description: "Show help".to_string(),
            },
        ]
    }

    #[must_use]
    pub fn bot_commands() -> Vec<BotCommand> {
        Self::all()
    }

    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let mut parts = text.trim().split_whitespace();
        let head = parts.next()?.to_lowercase();

        // Drop a bot mention if present (e.g. "/start@my_bot").
        let head = head.split('@').next().unwrap_or(&head);

        match head {
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/billing" => Some(Self::Billing {
                day: parts
                    .next()
                    .and_then(|arg| arg.parse::<u32>().ok())
                    .filter(|day| (1..=31).contains(day)),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        r"🤖 <b>Expense Tracker</b>

Commands:
/start - register and start tracking
/billing &lt;day&gt; - set the billing cycle anchor day (1-31)
/help - show this help

Everything else is plain conversation:
🍕 <b>Add:</b> &quot;bought pizza for 50&quot;, &quot;groceries 400 and fuel 200&quot;
📊 <b>Report:</b> &quot;show me the list&quot;
✏️ <b>Fix:</b> &quot;change the last one to 100&quot;, &quot;delete the pizza&quot;
🛠 <b>Reset:</b> &quot;delete everything&quot; (careful!)"
    }

    #[must_use]
    pub const fn welcome_text() -> &'static str {
        r"👋 <b>Welcome to Expense Tracker!</b>

I'm your personal finance assistant. Just talk to me. 💰

<b>What can you say?</b>
🍕 <b>Add an expense:</b>
- &quot;bought pizza for 50&quot;
- &quot;groceries 400 and fuel 200&quot;
- &quot;bought jeans at Zara for 300&quot; (I keep the place and date too!)

📊 <b>Reports:</b>
- &quot;show me the list&quot;
- &quot;how is this month looking?&quot;

✏️ <b>Fixes and deletions:</b>
- &quot;change the last one to 100&quot;
- &quot;delete the pizza&quot;
- &quot;move the jeans to yesterday at 5&quot;

🛠 <b>Reset:</b>
- &quot;delete everything&quot; (careful!)

👇 <b>To get started I need to identify you securely:</b>
please tap the button below to share your number."
    }
}
