mod test_answer_forwarded_only_to_host;
mod test_ping_pong;
