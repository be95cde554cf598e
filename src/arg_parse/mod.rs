use std::io::Error;

#[derive(Clone, Debug)]
pub struct CmdArgs {
    pub config: Option<String>,
    pub run_loop: bool,
    pub interval: Option<u64>,
}

impl CmdArgs {
    pub fn parse(args: Vec<String>) -> Result<Self, Error> {
        let mut config: Option<String> = None;
        let mut run_loop = false;
        let mut interval: Option<u64> = None;
        {
            let mut ap = argparse::ArgumentParser::new();
            ap.set_description("TradingEconomics and RSS news to Discord notifier");
            ap.refer(&mut config).add_option(
                &["-c", "--config"],
                argparse::StoreOption,
                "Optional JSON config file; environment variables override it",
            );
            ap.refer(&mut run_loop).add_option(
                &["-l", "--loop"],
                argparse::StoreTrue,
                "Run in a loop: fetch and notify, then sleep for INTERVAL seconds",
            );
            ap.refer(&mut interval).add_option(
                &["-i", "--interval"],
                argparse::StoreOption,
                "Loop interval in seconds (default 900, minimum 60); env NOTIFIER_INTERVAL_SECONDS",
            );

            match ap.parse(args, &mut std::io::stdout(), &mut std::io::stderr()) {
                Ok(()) => {}
                Err(_) => {
                    return Err(Error::from(std::io::ErrorKind::InvalidInput));
                }
            }
        }

        Ok(CmdArgs {
            config,
            run_loop,
            interval,
        })
    }
}
