use anyhow::Result;
use confab::chat_api::ChatConfig;
use confab::gui::run_gui;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    let config = ChatConfig::from_env();
    if config.api_key.is_empty() {
        info!("OPENAI_API_KEY is not set; requests will fail until it is provided");
    }

    run_gui(config)
}
