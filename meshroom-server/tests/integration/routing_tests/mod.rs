mod test_chat_broadcast;
