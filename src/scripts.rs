//! Documentation about the scripts contained herein
//!
//! - [check-rhv](#check-rhv)
//! - [restart-service](#restart-service)
//!
//! # check-rhv
//!
//! Needs https access to the RHV manager, and ssh access to the hosts for `services_status`.
//!
//! ```plain
//! $ check-rhv --help
//! check-rhv (part of rhv-plugins) 0.1.0
//! Check a Red Hat Virtualization manager and the hosts it manages
//!
//! Runs one measurement against the RHV API, prints what it found and exits 0, 1, 2 or 3 for ok, warning, critical or
//! unknown.
//!
//! USAGE:
//!     check-rhv [FLAGS] [OPTIONS] --measurement <measurement> --password <password> --rhv-manager-url <rhvm> --user <user>
//!
//! FLAGS:
//!     -h, --help        Prints help information
//!         --insecure    Don't verify the manager's TLS certificate
//!         --local       Log to stderr instead of the log directory. Use this when running by hand.
//!     -V, --version     Prints version information
//!
//! OPTIONS:
//!     -c, --critical <critical>              Critical value. Could be fraction or whole number.
//!         --log-dir <log-dir>                Directory to write logs to [default: /var/log/check-rhv]
//!     -m, --measurement <measurement>        Type of measurement to carry out, see below
//!     -p, --password <password>              API password [env: RHV_PASSWORD]
//!     -R, --rhv-manager-url <rhvm>           Host name or url of the RHV manager [env: RHV_MANAGER_URL=]
//!         --services <services>              JSON object of service name to text expected in its `systemctl status`
//!         --ssh-password <ssh-password>      Password to ssh to hosts with [env: RHV_SSH_PASSWORD]
//!         --ssh-timeout <ssh-timeout>        Seconds to wait for each ssh connection [default: 60]
//!         --ssh-user <ssh-user>              User to ssh to hosts as [default: root]
//!         --subnet-prefix <subnet-prefix>    Only ssh to host addresses starting with this [default: 10.]
//!         --timeout <timeout>                Seconds to wait for the API [default: 30]
//!     -u, --user <user>                      API user, e.g. admin@internal [env: RHV_USER=]
//!     -w, --warning <warning>                Warning value. Could be fraction or whole number.
//!
//! Measurements:
//!
//!     vm_count                Number of VMs.                   [default: -w 20 -c 30]
//!     locked_disks_count      Number of locked disks.          [default: -w 5 -c 10]
//!     storage_domain_usage    Fraction of each storage domain
//!                             that is used. Image domains are
//!                             skipped.                         [default: -w 0.75 -c 0.9]
//!     storage_domain_status   External status of each storage domain.
//!     hosts_status            Status of each host.
//!     datacenter_status       Status of each data center.
//!     services_status         Status of systemd services on each host, over ssh.
//!                             Requires --services and --ssh-password.
//!
//!     Warning and critical must be given together, or not at all. A value is a
//!     warning from the warning threshold up to and including the critical
//!     threshold, and critical above it.
//!
//! Examples:
//!
//!     check-rhv -R rhvm.example.com -u admin@internal -p secret -m vm_count -w 50 -c 80
//!
//!     check-rhv -R rhvm.example.com -u admin@internal -p secret -m services_status \
//!         --ssh-password hunter2 \
//!         --services '{"vdsmd": "Active: active (running)", "ovirt-ha-agent": "Active: active (running)"}'
//! ```
//!
//! # restart-service
//!
//! Shinken event handler. Needs ansible on the monitoring server.
//!
//! ```plain
//! $ restart-service --help
//! restart-service (part of rhv-plugins) 0.1.0
//! Restart a service via ansible once its check is confirmed critical.
//!
//! Restarts if the state is CRITICAL and HARD, or CRITICAL and SOFT on the last attempt before it would become HARD. Does
//! nothing otherwise.
//!
//! USAGE:
//!     restart-service [FLAGS] [OPTIONS] --attempt <attempt> --hostname <hostname> --service <service> --state <state> --type <state-type>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!         --local      Log to stderr instead of the log directory. Use this when running by hand.
//!     -V, --version    Prints version information
//!
//! OPTIONS:
//!         --ansible <ansible>              The ansible executable [default: ansible]
//!     -a, --attempt <attempt>              Attempt number on the service check
//!     -d, --directory <directory>
//!             Directory from which to run the command, usually where ansible config files reside. [default:
//!             /etc/shinken/ansible]
//!     -H, --hostname <hostname>            Hostname of client
//!         --log-dir <log-dir>              Directory to write logs to [default: /var/log/check-rhv]
//!     -m, --max-attempts <max-attempts>    Number of max attempts allowed on the service check [default: 3]
//!     -S, --service <service>              Service desired for restart
//!     -s, --state <state>                  State of the check (e.g. 'OK', 'WARNING', 'CRITICAL')
//!     -t, --type <state-type>              Type of the state ('HARD' or 'SOFT')
//!
//! Example Shinken command definition:
//!
//!     define command {
//!         command_name    restart-vdsmd
//!         command_line    $PLUGINSDIR$/restart-service -H $HOSTNAME$ -S vdsmd \
//!                         -s $SERVICESTATE$ -t $SERVICESTATETYPE$ \
//!                         -a $SERVICEATTEMPT$ -m $MAXSERVICEATTEMPTS$
//!     }
//! ```
