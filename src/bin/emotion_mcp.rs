use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    emotion_query::apps::run_emotion_mcp(std::env::args().skip(1))
}
