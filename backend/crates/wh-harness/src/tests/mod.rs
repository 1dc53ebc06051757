mod launch_command;
