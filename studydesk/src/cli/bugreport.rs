use bugreport::{
    bugreport,
    collector::{CompileTimeInformation, EnvironmentVariables, OperatingSystem, SoftwareVersion},
    format::Markdown,
};

pub fn run() {
    bugreport!()
        .info(SoftwareVersion::default())
        .info(OperatingSystem::default())
        .info(EnvironmentVariables::list(&[
            "SHELL",
            "TERM",
            "RUST_LOG",
            "STUDYDESK_PORT",
            "STUDYDESK_DATA_DIR",
            "STUDYDESK_METADATA",
            "STUDYDESK_S3_BUCKET",
            "STUDYDESK_S3_ENDPOINT",
            "STUDYDESK_S3_PUBLIC_ENDPOINT",
            "STUDYDESK_S3_REGION",
            "STUDYDESK_S3_PREFIX",
        ]))
        .info(CompileTimeInformation::default())
        .print::<Markdown>();
}
