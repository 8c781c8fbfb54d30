//! execv and run_program on the hosted platform.


use common::{boot, boot_with, record, run_to_completion};
use tkos_hosted::Fault;
use tkos_kernel::process::EXEC_FAILURE_CODE;
use tkos_kernel::syscall::errno;
use tkos_kernel::{ProcConfig, ProcError};

#[test]
fn run_program_passes_arguments() {
    let kernel = boot();
    let seen = record::<Vec<String>>();

    let log = seen.clone();
    kernel.register("/bin/echo", move |env| {
        log.lock().unwrap().push(env.args());
        0
    });

    run_to_completion(&kernel, "/bin/echo", &["echo", "hello", "world"]);
    assert_eq!(*seen.lock().unwrap(), vec![vec!["echo", "hello", "world"]]);
}

#[test]
fn execv_replaces_image_and_keeps_pid() {
    let kernel = boot();
    let seen = record::<(i32, Vec<String>)>();

    let log = seen.clone();
    kernel.register("/bin/echo", move |env| {
        log.lock().unwrap().push((env.getpid(), env.args()));
        3
    });
    kernel.register("/bin/init", |env| {
        let child = env
            .fork_with(|env| {
                let err = env.execv("/bin/echo", &["echo", "", "a b"]);
                panic!("execv returned {}", err)
            })
            .unwrap();
        let (pid, status) = env.waitpid(child, 0).unwrap();
        assert_eq!(pid, child);
        assert_eq!(status.exit_code(), Some(3));
        0
    });

    run_to_completion(&kernel, "/bin/init", &["init"]);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, 2);
    assert_eq!(seen[0].1, vec!["echo", "", "a b"]);
}

#[test]
fn execv_without_arguments() {
    let kernel = boot();
    let seen = record::<usize>();

    let log = seen.clone();
    kernel.register("/bin/noargs", move |env| {
        log.lock().unwrap().push(env.args().len());
        0
    });
    kernel.register("/bin/init", |env| {
        env.execv("/bin/noargs", &[]);
        1
    });

    run_to_completion(&kernel, "/bin/init", &["init"]);
    assert_eq!(*seen.lock().unwrap(), vec![0]);
}

#[test]
fn failed_exec_keeps_old_image() {
    let kernel = boot();
    kernel.register_data("/etc/motd");

    kernel.register("/bin/init", |env| {
        let marker = env.alloc_str("still here");
        let spaces = env.manager().platform().live_spaces();
        let processes = env.manager().process_count();

        assert_eq!(env.execv("/bin/missing", &["missing"]), errno::ENOENT);
        assert_eq!(env.execv("/etc/motd", &["motd"]), errno::ENOEXEC);

        env.manager().platform().inject(Fault::DefineStack);
        assert_eq!(env.execv("/bin/init", &["init"]), errno::ENOMEM);

        // Same memory, same table, no leaked space.
        let mut bytes = [0u8; 10];
        env.read(marker, &mut bytes);
        assert_eq!(&bytes, b"still here");
        assert_eq!(env.manager().platform().live_spaces(), spaces);
        assert_eq!(env.manager().process_count(), processes);
        0
    });

    run_to_completion(&kernel, "/bin/init", &["init"]);
}

#[test]
fn exec_rejects_null_pointers() {
    let kernel = boot();

    kernel.register("/bin/init", |env| {
        let path = env.alloc_str("/bin/init");
        let argv = env.alloc_argv(&["init"]);
        assert_eq!(env.execv_raw(0, argv), Err(errno::EINVAL));
        assert_eq!(env.execv_raw(path, 0), Err(errno::EINVAL));
        assert_eq!(env.execv_raw(0xdead_0000, argv), Err(errno::EFAULT));
        assert_eq!(env.execv_raw(path, 0xdead_0000), Err(errno::EFAULT));
        0
    });

    run_to_completion(&kernel, "/bin/init", &["init"]);
}

#[test]
fn exec_rejects_non_utf8_strings() {
    let kernel = boot();

    kernel.register("/bin/init", |env| {
        let bad = env.alloc(4);
        env.write(bad, &[0x2f, 0xff, 0xfe, 0]);

        let argv = env.alloc_argv(&["init"]);
        assert_eq!(env.execv_raw(bad, argv), Err(errno::EINVAL));

        let path = env.alloc_str("/bin/init");
        let argv = env.alloc(16);
        env.write(argv, &bad.to_ne_bytes());
        env.write(argv + 8, &0u64.to_ne_bytes());
        assert_eq!(env.execv_raw(path, argv), Err(errno::EINVAL));
        0
    });

    run_to_completion(&kernel, "/bin/init", &["init"]);
}

#[test]
fn exec_path_too_long() {
    let kernel = boot_with(ProcConfig::new().with_path_max(16));
    kernel.register("/bin/a-very-long-name", |_env| 0);

    kernel.register("/init", |env| {
        assert_eq!(
            env.execv("/bin/a-very-long-name", &["x"]),
            errno::ENAMETOOLONG
        );
        0
    });

    run_to_completion(&kernel, "/init", &["init"]);
    assert_eq!(
        kernel.run("/bin/a-very-long-name", &[]),
        Err(ProcError::NameTooLong)
    );
}

#[test]
fn exec_argument_limits() {
    let kernel = boot_with(ProcConfig::new().with_arg_limits(16, 3));
    kernel.register("/bin/true", |_env| 0);

    kernel.register("/init", |env| {
        assert_eq!(
            env.execv("/bin/true", &["true", "a", "b", "c"]),
            errno::E2BIG
        );
        assert_eq!(
            env.execv("/bin/true", &["true", "0123456789abcdef"]),
            errno::E2BIG
        );
        0
    });

    run_to_completion(&kernel, "/init", &["init"]);
    assert_eq!(
        kernel.run("/bin/true", &["1", "2", "3", "4"]),
        Err(ProcError::ArgListTooLong)
    );
}

#[test]
fn run_program_with_missing_image_exits_cleanly() {
    let kernel = boot();

    let pid = kernel.run("/bin/missing", &["missing"]).unwrap();
    kernel.wait_idle();
    assert!(!kernel.manager().contains(pid));
    assert_eq!(kernel.live_spaces(), 0);
}

#[test]
fn missing_image_reported_to_parent() {
    let kernel = boot();

    kernel.register("/bin/init", |env| {
        let child = env
            .fork_with(|env| {
                let err = env.execv("/bin/missing", &["missing"]);
                assert_eq!(err, errno::ENOENT);
                EXEC_FAILURE_CODE
            })
            .unwrap();
        let (_, status) = env.waitpid(child, 0).unwrap();
        assert_eq!(status.exit_code(), Some(EXEC_FAILURE_CODE));
        0
    });

    run_to_completion(&kernel, "/bin/init", &["init"]);
}
