mod test_join_requires_identity;
