mod claude_tests;
